//! Dashboard read model: account, network, balance, block and vote summary

use dashboard_types::{BalanceView, DashboardView, VotingSummary};

use crate::chain::{units, ChainClient};
use crate::chains;
use crate::session::DappSession;

/// "0x1234...abcd" form of an address
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

pub async fn build_dashboard(
    chain: &dyn ChainClient,
    chain_id: u64,
    session: &DappSession,
) -> DashboardView {
    let account = chain.account();
    let chain_view = chains::chain_view(chain_id);

    let balance_read = async {
        match account {
            Some(address) => Some(chain.balance(address).await),
            None => None,
        }
    };
    let (balance, block_number) = tokio::join!(balance_read, chain.block_number());

    let balance = match balance {
        Some(Ok(value)) => {
            let decimals = chains::native_decimals(chain_id);
            Some(BalanceView {
                value: value.to_string(),
                formatted: units::format_rounded(value, decimals, units::BALANCE_DISPLAY_PLACES),
                symbol: chain_view.native_symbol.clone(),
            })
        }
        Some(Err(e)) => {
            log::warn!("[CHAIN] Failed to read balance: {}", e);
            None
        }
        None => None,
    };

    let block_number = block_number
        .map_err(|e| log::warn!("[CHAIN] Failed to read block number: {}", e))
        .ok();

    let address = account.map(|a| format!("{:?}", a));

    DashboardView {
        is_connected: account.is_some(),
        short_address: address.as_deref().map(short_address),
        address,
        chain: Some(chain_view),
        balance,
        block_number,
        voting: session
            .voting
            .as_ref()
            .map(|v| v.summary())
            .unwrap_or(VotingSummary {
                enabled: false,
                loading_options: false,
                option_count: 0,
                total_votes: 0,
                has_voted: None,
            }),
    }
}
