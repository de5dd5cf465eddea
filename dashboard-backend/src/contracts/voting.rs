//! Voting contract binding
//!
//! getOptions() -> string[]
//! hasVoted(address) -> bool
//! getAllVotes() -> uint256[]   (parallel to getOptions)
//! vote(string)

use ethers::abi::{Abi, Token};
use ethers::types::{Address, Bytes, TxHash, U256};
use once_cell::sync::Lazy;
use std::sync::Arc;

use super::parse_abi_file;
use crate::chain::{ChainClient, ChainError};

static VOTING_ABI: Lazy<Result<Abi, String>> =
    Lazy::new(|| parse_abi_file(include_str!("../../abis/voting.json")));

pub struct VotingContract {
    address: Address,
    abi: Abi,
    client: Arc<dyn ChainClient>,
}

impl VotingContract {
    pub fn new(address: Address, client: Arc<dyn ChainClient>) -> Result<Self, String> {
        let abi = VOTING_ABI.clone()?;
        Ok(Self {
            address,
            abi,
            client,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn encode(&self, function: &str, args: &[Token]) -> Result<Bytes, ChainError> {
        let function = self
            .abi
            .function(function)
            .map_err(|e| ChainError::Decode(format!("Function '{}' not in ABI: {}", function, e)))?;
        function
            .encode_input(args)
            .map(Bytes::from)
            .map_err(|e| ChainError::Decode(format!("Failed to encode {}: {}", function.name, e)))
    }

    async fn read(&self, function: &str, args: &[Token]) -> Result<Token, ChainError> {
        let calldata = self.encode(function, args)?;
        let output = self.client.call(self.address, calldata).await?;

        let decoded = self
            .abi
            .function(function)
            .and_then(|f| f.decode_output(&output))
            .map_err(|e| ChainError::Decode(format!("{}: {}", function, e)))?;

        decoded
            .into_iter()
            .next()
            .ok_or_else(|| ChainError::Decode(format!("{} returned no values", function)))
    }

    pub async fn get_options(&self) -> Result<Vec<String>, ChainError> {
        let token = self.read("getOptions", &[]).await?;
        token
            .into_array()
            .ok_or_else(|| ChainError::Decode("getOptions: expected string[]".to_string()))?
            .into_iter()
            .map(|t| {
                t.into_string()
                    .ok_or_else(|| ChainError::Decode("getOptions: expected string".to_string()))
            })
            .collect()
    }

    pub async fn has_voted(&self, voter: Address) -> Result<bool, ChainError> {
        self.read("hasVoted", &[Token::Address(voter)])
            .await?
            .into_bool()
            .ok_or_else(|| ChainError::Decode("hasVoted: expected bool".to_string()))
    }

    pub async fn get_all_votes(&self) -> Result<Vec<U256>, ChainError> {
        let token = self.read("getAllVotes", &[]).await?;
        token
            .into_array()
            .ok_or_else(|| ChainError::Decode("getAllVotes: expected uint256[]".to_string()))?
            .into_iter()
            .map(|t| {
                t.into_uint()
                    .ok_or_else(|| ChainError::Decode("getAllVotes: expected uint256".to_string()))
            })
            .collect()
    }

    pub fn encode_vote(&self, option: &str) -> Result<Bytes, ChainError> {
        self.encode("vote", &[Token::String(option.to_string())])
    }

    /// Submit vote(option). Returns once the node accepts the transaction.
    pub async fn vote(&self, option: &str) -> Result<TxHash, ChainError> {
        let calldata = self.encode_vote(option)?;
        self.client
            .send_transaction(self.address, U256::zero(), Some(calldata))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockChainClient, VotingState};
    use ethers::utils::id;

    fn contract(mock: Arc<MockChainClient>) -> VotingContract {
        VotingContract::new(Address::repeat_byte(0x42), mock).unwrap()
    }

    #[test]
    fn test_vote_calldata() {
        let mock = Arc::new(MockChainClient::connected());
        let data = contract(mock).encode_vote("Rust").unwrap();
        assert_eq!(&data[0..4], &id("vote(string)"));
        let decoded = ethers::abi::decode(&[ethers::abi::ParamType::String], &data[4..]).unwrap();
        assert_eq!(decoded, vec![Token::String("Rust".to_string())]);
    }

    #[tokio::test]
    async fn test_reads_decode() {
        let state = VotingState::new(&["A", "B"], &[3, 5]);
        state.set_has_voted(true);
        let mock = Arc::new(MockChainClient::connected().with_voting(state));
        let contract = contract(mock.clone());

        assert_eq!(contract.get_options().await.unwrap(), vec!["A", "B"]);
        assert_eq!(
            contract.get_all_votes().await.unwrap(),
            vec![U256::from(3), U256::from(5)]
        );
        assert!(contract.has_voted(Address::repeat_byte(1)).await.unwrap());
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_vote_sends_to_contract_with_zero_value() {
        let mock = Arc::new(MockChainClient::connected());
        let contract = contract(mock.clone());

        contract.vote("B").await.unwrap();

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, Address::repeat_byte(0x42));
        assert_eq!(sent[0].value, U256::zero());
        assert!(sent[0].data.is_some());
    }

    #[tokio::test]
    async fn test_malformed_response_is_decode_error() {
        let mock = Arc::new(MockChainClient::connected());
        // no voting state configured: every call returns empty bytes
        let err = contract(mock).get_options().await.unwrap_err();
        assert!(matches!(err, ChainError::Decode(_)));
    }
}
