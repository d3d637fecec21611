//! Admin Command Dispatcher
//!
//! Executes privileged commands for staff and admin senders. Always returns
//! reply text: malformed input becomes usage help and store failures become
//! a fixed failure reply.

use std::sync::Arc;

use deji_common::RepositoryError;
use deji_messaging::{channel_for_address, Outbound, OutboundSender, INVOICE_DISPATCH};
use uuid::Uuid;

use crate::domain::command::{Command, UsageHelp};
use crate::domain::replies;
use crate::repository::AssistantRepositories;

#[derive(Clone)]
pub struct CommandDispatcher {
    repos: AssistantRepositories,
    sender: Arc<OutboundSender>,
}

impl CommandDispatcher {
    pub fn new(repos: AssistantRepositories, sender: Arc<OutboundSender>) -> Self {
        Self { repos, sender }
    }

    pub async fn dispatch(&self, tenant_id: Uuid, text: &str) -> String {
        self.run(tenant_id, text, false).await
    }

    /// Like `dispatch`, but commands that mutate or send are answered with
    /// a fixed notice instead of running.
    pub async fn preview(&self, tenant_id: Uuid, text: &str) -> String {
        self.run(tenant_id, text, true).await
    }

    async fn run(&self, tenant_id: Uuid, text: &str, preview: bool) -> String {
        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(help) => {
                tracing::debug!(tenant_id = %tenant_id, help = ?help, "Command not recognised");
                return help.message().to_string();
            }
        };

        if preview && command.is_mutating() {
            tracing::info!(tenant_id = %tenant_id, command = ?command, "Mutating command skipped in preview");
            return replies::COMMAND_NOT_PREVIEWED.to_string();
        }

        tracing::info!(tenant_id = %tenant_id, command = ?command, "Executing admin command");

        match self.execute(tenant_id, command).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(tenant_id = %tenant_id, error = %e, "Admin command failed");
                replies::COMMAND_FAILED.to_string()
            }
        }
    }

    async fn execute(&self, tenant_id: Uuid, command: Command) -> Result<String, RepositoryError> {
        match command {
            Command::DeliverAll => {
                let moved = self.repos.invoices.deliver_all_pending(tenant_id).await?;
                Ok(replies::delivered_all(moved))
            }
            Command::DeliverOne(invoice_id) => {
                let updated = self
                    .repos
                    .invoices
                    .deliver_pending(tenant_id, invoice_id)
                    .await?;
                Ok(replies::delivered_one(invoice_id, updated))
            }
            Command::LowStock { threshold } => {
                let products = self.repos.catalog.low_stock(tenant_id, threshold).await?;
                Ok(replies::low_stock_list(threshold, &products))
            }
            Command::InvoiceSend {
                invoice_id,
                address,
            } => self.send_invoice(tenant_id, invoice_id, &address).await,
            Command::LedgerBalance => {
                let balance = self.repos.ledger.balance(tenant_id).await?;
                Ok(replies::ledger_balance(balance))
            }
        }
    }

    async fn send_invoice(
        &self,
        tenant_id: Uuid,
        invoice_id: i64,
        address: &str,
    ) -> Result<String, RepositoryError> {
        let Some(channel) = channel_for_address(address) else {
            return Ok(UsageHelp::Invoice.message().to_string());
        };

        let Some(invoice) = self.repos.invoices.find(tenant_id, invoice_id).await? else {
            return Ok(replies::invoice_not_found(invoice_id));
        };

        let summary = replies::invoice_summary(&invoice);
        let record = self
            .sender
            .deliver(Outbound {
                tenant_id,
                channel,
                category: INVOICE_DISPATCH,
                recipient: address,
                body: &summary,
            })
            .await;

        Ok(if record.is_sent() {
            replies::invoice_sent(invoice_id, address)
        } else {
            replies::invoice_send_failed(invoice_id, address)
        })
    }
}
