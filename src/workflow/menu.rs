//! The transaction menu rendered between steps.

use std::fmt;

use strum::IntoEnumIterator;

use super::context::WorkflowContext;

/// Actions offered by the transaction menu.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum MenuAction {
    SelectEdit,
    ConfirmAmounts,
    SelectFee,
    /// decline the current broadcaster and pick another for the same fee
    /// token
    DifferentBroadcaster,
    GenerateProof,
    SendTransaction,
    ExitMenu,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub action: MenuAction,
    pub label: String,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Menu {
    pub title: String,
    /// one line per populated part of the context
    pub summary: Vec<String>,
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn for_context(ctx: &WorkflowContext) -> Self {
        let flags = ctx.flags();
        let intent = ctx.intent();
        let relayed = ctx.fee_strategy().is_some_and(|s| s.is_relayed());

        let items = MenuAction::iter()
            .filter(|action| *action != MenuAction::DifferentBroadcaster || relayed)
            .map(|action| {
                let (label, enabled) = match action {
                    MenuAction::SelectEdit => {
                        let noun = if intent.is_swap() { "swap" } else { "amounts" };
                        let verb = if ctx.payload().is_empty() {
                            "Select"
                        } else {
                            "Edit"
                        };
                        (format!("{} {}", verb, noun), true)
                    }
                    MenuAction::ConfirmAmounts => (
                        "Confirm amounts".to_string(),
                        !flags.confirm_amounts_disabled,
                    ),
                    MenuAction::SelectFee => {
                        let label = if ctx.fee_strategy().is_some() {
                            "Change fee"
                        } else {
                            "Select fee"
                        };
                        (label.to_string(), !flags.select_fees_disabled)
                    }
                    MenuAction::DifferentBroadcaster => (
                        "Select different broadcaster".to_string(),
                        !flags.select_fees_disabled,
                    ),
                    MenuAction::GenerateProof => {
                        let label = if intent.requires_proof() {
                            "Generate proof"
                        } else {
                            "Build transaction"
                        };
                        (label.to_string(), !flags.generate_proof_disabled)
                    }
                    MenuAction::SendTransaction => (
                        "Send transaction".to_string(),
                        !flags.send_transaction_disabled,
                    ),
                    MenuAction::ExitMenu => ("Cancel".to_string(), true),
                };
                MenuItem {
                    action,
                    label,
                    enabled,
                }
            })
            .collect();

        Self {
            title: intent.title().to_string(),
            summary: summary(ctx),
            items,
        }
    }

    pub fn is_enabled(&self, action: MenuAction) -> bool {
        self.items
            .iter()
            .any(|item| item.action == action && item.enabled)
    }

    pub fn enabled_actions(&self) -> Vec<MenuAction> {
        self.items
            .iter()
            .filter(|item| item.enabled)
            .map(|item| item.action)
            .collect()
    }
}

fn summary(ctx: &WorkflowContext) -> Vec<String> {
    let mut lines = vec![ctx.payload().to_string()];
    if let Some(strategy) = ctx.fee_strategy() {
        lines.push(format!("Fee: {}", strategy));
    }
    match (ctx.gas_estimate(), ctx.fee_strategy()) {
        (Some(estimate), _) => lines.push(format!("Gas: {}", estimate)),
        (None, Some(_)) => lines.push("Gas: estimate unavailable".to_string()),
        (None, None) => {}
    }
    if ctx.proven().is_some() {
        lines.push("Transaction ready to send".to_string());
    }
    lines
}

impl fmt::Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for line in &self.summary {
            writeln!(f, "  {}", line)?;
        }
        for (i, item) in self.items.iter().enumerate() {
            let marker = if item.enabled { ' ' } else { 'x' };
            writeln!(f, "{} {}. {}", marker, i + 1, item.label)?;
        }
        Ok(())
    }
}
