//! Scripted ChainClient for unit tests
//!
//! Records every send and call. Receipts confirm immediately unless a test
//! holds one with `hold_next_receipt`, in which case the watcher blocks until
//! the returned sender fires (or is dropped).

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, Bytes, TxHash, U256};
use ethers::utils::id;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

use crate::chain::{ChainClient, ChainError, ReceiptSummary};

pub const TEST_ACCOUNT: Address = Address::repeat_byte(0xaa);

#[derive(Debug, Clone)]
pub struct SentTx {
    pub to: Address,
    pub value: U256,
    pub data: Option<Bytes>,
}

struct VotingStateInner {
    options: Vec<String>,
    votes: Vec<u64>,
    has_voted: bool,
    all_votes_reads: usize,
}

/// Contract storage served by the mock for the voting ABI
#[derive(Clone)]
pub struct VotingState {
    inner: Arc<Mutex<VotingStateInner>>,
}

impl VotingState {
    pub fn new(options: &[&str], votes: &[u64]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VotingStateInner {
                options: options.iter().map(|o| o.to_string()).collect(),
                votes: votes.to_vec(),
                has_voted: false,
                all_votes_reads: 0,
            })),
        }
    }

    pub fn set_votes(&self, votes: &[u64]) {
        self.inner.lock().votes = votes.to_vec();
    }

    pub fn set_has_voted(&self, has_voted: bool) {
        self.inner.lock().has_voted = has_voted;
    }

    /// Number of getAllVotes() reads served so far
    pub fn all_votes_reads(&self) -> usize {
        self.inner.lock().all_votes_reads
    }

    fn respond(&self, data: &[u8]) -> Bytes {
        if data.len() < 4 {
            return Bytes::new();
        }
        let selector = &data[0..4];
        let mut state = self.inner.lock();

        let token = if selector == id("getOptions()") {
            Token::Array(state.options.iter().cloned().map(Token::String).collect())
        } else if selector == id("hasVoted(address)") {
            Token::Bool(state.has_voted)
        } else if selector == id("getAllVotes()") {
            state.all_votes_reads += 1;
            Token::Array(state.votes.iter().map(|v| Token::Uint(U256::from(*v))).collect())
        } else {
            return Bytes::new();
        };
        Bytes::from(ethers::abi::encode(&[token]))
    }
}

pub struct MockChainClient {
    account: Option<Address>,
    chain_id: u64,
    balance: U256,
    block_number: u64,
    voting: Option<VotingState>,
    fail_calls: AtomicBool,
    calls: AtomicUsize,
    sent: Mutex<Vec<SentTx>>,
    send_failures: Mutex<VecDeque<ChainError>>,
    held_receipts: Mutex<VecDeque<oneshot::Receiver<Result<(), ChainError>>>>,
    held_sends: Mutex<VecDeque<oneshot::Receiver<()>>>,
    read_gate: Mutex<Option<watch::Receiver<bool>>>,
}

impl MockChainClient {
    fn with_account(account: Option<Address>) -> Self {
        Self {
            account,
            chain_id: 11_155_111,
            balance: U256::exp10(18),
            block_number: 1_000,
            voting: None,
            fail_calls: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            send_failures: Mutex::new(VecDeque::new()),
            held_receipts: Mutex::new(VecDeque::new()),
            held_sends: Mutex::new(VecDeque::new()),
            read_gate: Mutex::new(None),
        }
    }

    pub fn connected() -> Self {
        Self::with_account(Some(TEST_ACCOUNT))
    }

    pub fn disconnected() -> Self {
        Self::with_account(None)
    }

    pub fn with_voting(mut self, state: VotingState) -> Self {
        self.voting = Some(state);
        self
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    /// Make every read (call, balance, block number) fail
    pub fn fail_reads(&self) {
        self.fail_calls.store(true, Ordering::SeqCst);
    }

    /// The next send_transaction is rejected with `err`
    pub fn fail_next_send(&self, err: ChainError) {
        self.send_failures.lock().push_back(err);
    }

    /// The next wait_for_receipt blocks until the returned sender fires
    pub fn hold_next_receipt(&self) -> oneshot::Sender<Result<(), ChainError>> {
        let (tx, rx) = oneshot::channel();
        self.held_receipts.lock().push_back(rx);
        tx
    }

    /// The next send_transaction blocks until the returned sender fires.
    /// Keep the sender alive to make the send hang.
    pub fn hold_next_send(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.held_sends.lock().push_back(rx);
        tx
    }

    /// Contract calls block until `true` is sent on the returned channel
    pub fn hold_reads(&self) -> watch::Sender<bool> {
        let (tx, rx) = watch::channel(false);
        *self.read_gate.lock() = Some(rx);
        tx
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.sent.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> Result<(), ChainError> {
        if self.fail_calls.load(Ordering::SeqCst) {
            Err(ChainError::Rpc("node unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.chain_id)
    }

    async fn balance(&self, _address: Address) -> Result<U256, ChainError> {
        self.check_reads()?;
        Ok(self.balance)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.check_reads()?;
        Ok(self.block_number)
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.read_gate.lock().clone();
        if let Some(mut gate) = gate {
            let _ = gate.wait_for(|open| *open).await;
        }
        self.check_reads()?;
        Ok(match &self.voting {
            Some(state) => state.respond(&data),
            None => Bytes::new(),
        })
    }

    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Option<Bytes>,
    ) -> Result<TxHash, ChainError> {
        if self.account.is_none() {
            return Err(ChainError::NotConnected);
        }
        let held = self.held_sends.lock().pop_front();
        if let Some(rx) = held {
            let _ = rx.await;
        }
        let mut sent = self.sent.lock();
        sent.push(SentTx { to, value, data });
        if let Some(err) = self.send_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(TxHash::from_low_u64_be(sent.len() as u64))
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary, ChainError> {
        let held = self.held_receipts.lock().pop_front();
        if let Some(rx) = held {
            match rx.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(ChainError::Rpc("receipt channel closed".to_string())),
            }
        }
        Ok(ReceiptSummary {
            tx_hash,
            block_number: Some(self.block_number + 1),
            gas_used: Some(U256::from(21_000)),
        })
    }
}
