//! Propose, confirm and execute flows for one Safe account.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde_json::Value;
use tracing::{info, warn};

use fortius_safe_core::builders::{self, BuildError};
use fortius_safe_core::{
    assemble_history, AnnotatedRecord, CalldataDecoder, ChainPort, ExecutionResult, OwnerChange,
    OwnerSigner, PortError, ProposalRequest, ProposeOutcome, SafeServicePort, SafeTxDraft,
    ScheduleAction, ScheduleExecution, ScheduleExecutionResult, ScheduleProposal,
    SelectorRegistry, ServiceTransaction, TransferRequest, TxHistoryPort,
};

use crate::config::AdapterConfig;
use crate::hashing;

const INSUFFICIENT_BALANCE: &str = "Safe account does not have enough money";
const NOT_ENOUGH_APPROVAL: &str = "Not enough approval";

#[derive(Debug)]
pub struct SafeHandler<S, C, W> {
    safe_address: Address,
    chain_id: u64,
    safe_version: String,
    timelock_module: Option<Address>,
    multisend: Address,
    service: S,
    chain: C,
    signer: W,
    decoder: CalldataDecoder,
}

fn build_error(e: BuildError) -> PortError {
    PortError::Validation(e.to_string())
}

impl<S, C, W> SafeHandler<S, C, W>
where
    S: SafeServicePort + TxHistoryPort,
    C: ChainPort,
    W: OwnerSigner,
{
    pub fn new(cfg: &AdapterConfig, safe_address: Address, service: S, chain: C, signer: W) -> Self {
        Self {
            safe_address,
            chain_id: cfg.chain_id,
            safe_version: cfg.safe_version.clone(),
            timelock_module: cfg.timelock_module_address,
            multisend: cfg.multisend_address,
            service,
            chain,
            signer,
            decoder: CalldataDecoder::new(
                SelectorRegistry::builtin().clone(),
                cfg.decoder_config(),
            ),
        }
    }

    pub fn safe_address(&self) -> Address {
        self.safe_address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub async fn history(&self) -> Vec<AnnotatedRecord> {
        assemble_history(&self.service, &self.decoder, self.safe_address).await
    }

    pub async fn get_owners(&self) -> Result<Vec<Address>, PortError> {
        Ok(self.service.safe_info(self.safe_address).await?.owners)
    }

    pub async fn get_threshold(&self) -> Result<u64, PortError> {
        Ok(self.service.safe_info(self.safe_address).await?.threshold)
    }

    pub async fn get_nonce(&self) -> Result<u64, PortError> {
        Ok(self.service.safe_info(self.safe_address).await?.nonce)
    }

    pub async fn is_owner(&self, account: Address) -> Result<bool, PortError> {
        Ok(self.get_owners().await?.contains(&account))
    }

    pub async fn get_transaction(&self, safe_tx_hash: B256) -> Result<ServiceTransaction, PortError> {
        self.service
            .fetch_tx(safe_tx_hash)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("safe transaction {safe_tx_hash}")))
    }

    pub async fn get_balances(&self) -> Result<Vec<Value>, PortError> {
        self.service.balances(self.safe_address).await
    }

    async fn resolve_nonce(&self, nonce: Option<u64>) -> Result<u64, PortError> {
        match nonce {
            Some(nonce) => Ok(nonce),
            None => self.get_nonce().await,
        }
    }

    fn hash(&self, draft: &SafeTxDraft, nonce: u64) -> Result<B256, PortError> {
        hashing::safe_tx_hash(
            self.chain_id,
            self.safe_address,
            nonce,
            &self.safe_version,
            draft,
        )
    }

    async fn submit(&self, draft: &SafeTxDraft, nonce: u64, safe_tx_hash: B256) -> Result<(), PortError> {
        let signature = self.signer.sign_hash(safe_tx_hash).await?;
        let proposal = ProposalRequest::new(draft, nonce, safe_tx_hash, self.signer.address(), signature);
        self.service.propose_tx(self.safe_address, &proposal).await?;
        info!(safe = %self.safe_address, %safe_tx_hash, nonce, "proposed safe transaction");
        Ok(())
    }

    /// Hashes, signs and posts `draft`. Without an explicit nonce the Safe's current one is used.
    pub async fn propose(&self, draft: &SafeTxDraft, nonce: Option<u64>) -> Result<B256, PortError> {
        let nonce = self.resolve_nonce(nonce).await?;
        let safe_tx_hash = self.hash(draft, nonce)?;
        self.submit(draft, nonce, safe_tx_hash).await?;
        Ok(safe_tx_hash)
    }

    pub async fn propose_timelock_schedule(
        &self,
        action: &ScheduleAction,
        nonce: Option<u64>,
    ) -> Result<ScheduleProposal, PortError> {
        let module = self
            .timelock_module
            .ok_or_else(|| PortError::Policy("timelock module address is not configured".to_owned()))?;
        if action.recipients.len() != action.values.len() {
            return Err(PortError::Validation(format!(
                "{} recipients but {} values",
                action.recipients.len(),
                action.values.len()
            )));
        }

        let draft = builders::schedule_call(module, action);
        let safe_tx_hash = self.propose(&draft, nonce).await?;

        let output = self
            .chain
            .call(module, builders::hash_operation_calldata(self.safe_address, action))
            .await?;
        let schedule_id = builders::decode_hash_operation(&output)
            .map_err(|e| PortError::Validation(format!("hashOperation output: {e}")))?;

        Ok(ScheduleProposal {
            safe_tx_hash,
            safe_address: self.safe_address,
            schedule_id,
            execution_time: action.timestamp,
            token_address: action.token,
            amount_total: action.amount_total(),
        })
    }

    /// Proposes the transfers as one Safe transaction unless the service already knows it.
    pub async fn propose_transfers(
        &self,
        token: Option<Address>,
        legs: &[TransferRequest],
        nonce: Option<u64>,
    ) -> Result<ProposeOutcome, PortError> {
        let draft = builders::batch(self.multisend, builders::transfer_calls(token, legs))
            .map_err(build_error)?;
        let nonce = self.resolve_nonce(nonce).await?;
        let safe_tx_hash = self.hash(&draft, nonce)?;

        if self.service.fetch_tx(safe_tx_hash).await?.is_some() {
            info!(%safe_tx_hash, "transaction already proposed");
            return Ok(ProposeOutcome::AlreadyProposed(safe_tx_hash));
        }

        self.submit(&draft, nonce, safe_tx_hash).await?;
        Ok(ProposeOutcome::Proposed(safe_tx_hash))
    }

    pub async fn propose_invite_members(
        &self,
        owners: &[Address],
        new_threshold: u64,
        nonce: Option<u64>,
    ) -> Result<B256, PortError> {
        let current_threshold = self.get_threshold().await?;
        let calls =
            builders::invite_members_calls(self.safe_address, owners, current_threshold, new_threshold);
        let draft = builders::batch(self.multisend, calls).map_err(build_error)?;
        self.propose(&draft, nonce).await
    }

    pub async fn propose_owner_change(
        &self,
        change: OwnerChange,
        threshold: u64,
        nonce: Option<u64>,
    ) -> Result<B256, PortError> {
        let draft = match change {
            OwnerChange::Add(owner) => builders::add_owner_call(self.safe_address, owner, threshold),
            OwnerChange::Remove(owner) => {
                let owners = self.get_owners().await?;
                builders::remove_owner_call(self.safe_address, &owners, owner, threshold)
                    .map_err(build_error)?
            }
        };
        self.propose(&draft, nonce).await
    }

    pub async fn propose_threshold_change(
        &self,
        threshold: u64,
        nonce: Option<u64>,
    ) -> Result<B256, PortError> {
        let owners = self.get_owners().await?;
        if threshold == 0 || threshold as usize > owners.len() {
            return Err(build_error(BuildError::Threshold {
                threshold,
                owners: owners.len(),
            }));
        }
        self.propose(&builders::change_threshold_call(self.safe_address, threshold), nonce)
            .await
    }

    /// Queues an empty self call at `nonce`, replacing the transaction queued there.
    pub async fn propose_rejection(&self, nonce: u64) -> Result<B256, PortError> {
        self.propose(&builders::rejection_tx(self.safe_address), Some(nonce))
            .await
    }

    pub async fn confirm_transaction(&self, safe_tx_hash: B256) -> Result<(), PortError> {
        let signature = self.signer.sign_hash(safe_tx_hash).await?;
        self.service.confirm_tx(safe_tx_hash, &signature).await?;
        info!(%safe_tx_hash, owner = %self.signer.address(), "confirmed safe transaction");
        Ok(())
    }

    pub async fn is_enough_approval(&self, safe_tx_hash: B256) -> Result<bool, PortError> {
        let tx = self.get_transaction(safe_tx_hash).await?;
        Ok(tx.confirmations.len() as u64 >= tx.confirmations_required)
    }

    /// `token` of `None` or the zero address means the chain's native currency.
    pub async fn is_balance_sufficient(
        &self,
        token: Option<Address>,
        amount: U256,
    ) -> Result<bool, PortError> {
        let balance = match token {
            Some(token) if token != Address::ZERO => {
                let output = self
                    .chain
                    .call(token, builders::balance_of_calldata(self.safe_address))
                    .await?;
                builders::decode_balance_of(&output)
                    .map_err(|e| PortError::Validation(format!("balanceOf output: {e}")))?
            }
            _ => self.chain.balance(self.safe_address).await?,
        };
        Ok(balance >= amount)
    }

    async fn try_execute(
        &self,
        safe_tx_hash: B256,
        token: Option<Address>,
        amount: U256,
    ) -> Result<ExecutionResult, PortError> {
        if !self.is_balance_sufficient(token, amount).await? {
            return Ok(ExecutionResult {
                is_success: false,
                tx_hash: None,
                message: INSUFFICIENT_BALANCE.to_owned(),
            });
        }

        let tx = self.get_transaction(safe_tx_hash).await?;
        if tx.is_executed {
            return Err(PortError::Policy(format!("{safe_tx_hash} was already executed")));
        }
        if (tx.confirmations.len() as u64) < tx.confirmations_required {
            return Ok(ExecutionResult {
                is_success: false,
                tx_hash: None,
                message: NOT_ENOUGH_APPROVAL.to_owned(),
            });
        }

        let signatures = builders::sorted_signatures(&tx).map_err(build_error)?;
        let calldata: Bytes = builders::exec_transaction_calldata(&tx, signatures);
        let tx_hash = self
            .signer
            .send_transaction(self.safe_address, calldata)
            .await?;
        info!(%safe_tx_hash, %tx_hash, "submitted execTransaction");

        Ok(ExecutionResult {
            is_success: true,
            tx_hash: Some(tx_hash),
            message: String::new(),
        })
    }

    /// Executes a fully confirmed transaction. Failures are reported in the result.
    pub async fn execute_transaction(
        &self,
        safe_tx_hash: B256,
        token: Option<Address>,
        amount: U256,
    ) -> ExecutionResult {
        match self.try_execute(safe_tx_hash, token, amount).await {
            Ok(result) => result,
            Err(e) => {
                warn!(%safe_tx_hash, error = %e, "execution failed");
                ExecutionResult {
                    is_success: false,
                    tx_hash: None,
                    message: e.to_string(),
                }
            }
        }
    }

    async fn try_execute_schedule(&self, request: &ScheduleExecution) -> Result<Result<B256, String>, PortError> {
        let module = self
            .timelock_module
            .ok_or_else(|| PortError::Policy("timelock module address is not configured".to_owned()))?;
        if !self
            .is_balance_sufficient(request.token, request.amount_total)
            .await?
        {
            return Ok(Err("Insufficient balance to trade".to_owned()));
        }
        if !self.is_enough_approval(request.safe_tx_hash).await? {
            return Ok(Err(NOT_ENOUGH_APPROVAL.to_owned()));
        }

        let calldata = builders::execute_schedule_calldata(self.safe_address, request.schedule_id);
        let tx_hash = self.signer.send_transaction(module, calldata).await?;
        info!(schedule_id = %request.schedule_id, %tx_hash, "submitted timelock execute");
        Ok(Ok(tx_hash))
    }

    /// Runs a queued timelock schedule once its Safe transaction has enough approvals.
    pub async fn execute_schedule(&self, request: &ScheduleExecution) -> ScheduleExecutionResult {
        let outcome = match self.try_execute_schedule(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(schedule_id = %request.schedule_id, error = %e, "timelock execute failed");
                Err(e.to_string())
            }
        };

        let (executed_tx_hash, msg_error) = match outcome {
            Ok(hash) => (Some(hash), None),
            Err(message) => (None, Some(message)),
        };
        ScheduleExecutionResult {
            msg_error,
            executed_tx_hash,
            schedule_id: request.schedule_id,
            chain_id: self.chain_id,
        }
    }
}
