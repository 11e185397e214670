//! [Prompter] for an interactive terminal.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;
use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::Clear;
use crossterm::terminal::ClearType;
use itertools::Itertools;
use shielded_tx_workflow::api::prompts::Prompter;
use shielded_tx_workflow::config_models::network::ChainConfig;
use shielded_tx_workflow::models::address::Address;
use shielded_tx_workflow::models::amount::TokenAmount;
use shielded_tx_workflow::models::fee::FeeMode;
use shielded_tx_workflow::models::fee::PublicSigner;
use shielded_tx_workflow::models::fee::SelectedBroadcaster;
use shielded_tx_workflow::models::fee::TokenInfo;
use shielded_tx_workflow::models::intent::TransactionIntent;
use shielded_tx_workflow::models::proven_transaction::ProofProgress;
use shielded_tx_workflow::models::selection::AmountSelection;
use shielded_tx_workflow::models::selection::SwapSelection;
use shielded_tx_workflow::state::status::StatusQueue;
use shielded_tx_workflow::workflow::menu::Menu;
use shielded_tx_workflow::workflow::menu::MenuAction;
use strum::IntoEnumIterator;
use zeroize::Zeroizing;

use super::line_input::LineInput;

#[derive(Debug)]
pub struct TerminalPrompter {
    chain: ChainConfig,
    tokens: Vec<TokenInfo>,
    status: StatusQueue,
    input: LineInput,
}

impl TerminalPrompter {
    pub fn new(chain: ChainConfig, tokens: Vec<TokenInfo>, status: StatusQueue) -> Self {
        Self {
            chain,
            tokens,
            status,
            input: LineInput::default(),
        }
    }

    /// ask which kind of transaction to build. `None` if the user quits.
    pub async fn select_intent(&self) -> Result<Option<TransactionIntent>> {
        let intents = TransactionIntent::iter().collect_vec();
        println!("What do you want to do?");
        for (i, intent) in intents.iter().enumerate() {
            println!("  {}) {}", i + 1, intent.title());
        }
        let choice = self
            .input
            .read_choice("Choice (empty to quit): ", intents.len())
            .await?;
        Ok(choice.map(|i| intents[i]))
    }

    /// print every status message still queued
    pub fn flush_status(&self) {
        for message in self.status.peek_all() {
            println!("[status] {}", message);
        }
    }

    /// tokens the user may move for `intent`
    fn tokens_for(&self, intent: TransactionIntent) -> Vec<TokenInfo> {
        match intent {
            TransactionIntent::ShieldBase | TransactionIntent::UnshieldBase => vec![TokenInfo {
                address: self.chain.wrapped_base_token.clone(),
                symbol: self.chain.base_token_symbol.clone(),
                decimals: self.chain.base_token_decimals,
            }],
            TransactionIntent::PublicBaseTransfer => vec![TokenInfo {
                address: Address::native_token(),
                symbol: self.chain.base_token_symbol.clone(),
                decimals: self.chain.base_token_decimals,
            }],
            _ => self.tokens.clone(),
        }
    }

    async fn select_token(&self, tokens: &[TokenInfo], prompt: &str) -> Result<Option<TokenInfo>> {
        for (i, token) in tokens.iter().enumerate() {
            println!("  {}) {}", i + 1, token.symbol);
        }
        let choice = self.input.read_choice(prompt, tokens.len()).await?;
        Ok(choice.map(|i| tokens[i].clone()))
    }

    async fn read_amount(&self, token: &TokenInfo) -> Result<Option<TokenAmount>> {
        loop {
            let Some(answer) = self
                .input
                .read_answer(&format!("Amount of {}: ", token.symbol))
                .await?
            else {
                return Ok(None);
            };
            match TokenAmount::parse_units(&answer, token.decimals) {
                Ok(amount) if !amount.is_zero() => return Ok(Some(amount)),
                Ok(_) => println!("Amount must be positive."),
                Err(e) => println!("{}", e),
            }
        }
    }

    async fn read_address(&self, prompt: &str) -> Result<Option<Address>> {
        loop {
            let Some(answer) = self.input.read_answer(prompt).await? else {
                return Ok(None);
            };
            match answer.parse::<Address>() {
                Ok(address) => return Ok(Some(address)),
                Err(e) => println!("{}", e),
            }
        }
    }

    fn show_status(&self) {
        if let Some(message) = self.status.current(Utc::now()) {
            println!("[status] {}", message.message);
        }
    }
}

#[async_trait::async_trait]
impl Prompter for TerminalPrompter {
    async fn select_action(&self, menu: &Menu) -> Result<MenuAction> {
        self.show_status();
        println!();
        println!("{}", menu);

        let enabled = menu.enabled_actions();
        loop {
            let answer = self.input.read_line("Action: ").await?;
            let Some(answer) = answer else {
                return Ok(MenuAction::ExitMenu);
            };
            let picked = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| menu.items.get(n.wrapping_sub(1)))
                .map(|item| item.action)
                .or_else(|| answer.parse::<MenuAction>().ok());

            match picked {
                Some(action) if enabled.contains(&action) => return Ok(action),
                Some(action) => println!("{} is not available yet.", action),
                None => println!("Unknown action {:?}.", answer),
            }
        }
    }

    async fn select_amounts(
        &self,
        intent: TransactionIntent,
    ) -> Result<Option<Vec<AmountSelection>>> {
        let tokens = self.tokens_for(intent);
        let mut selections = vec![];
        println!("Add amounts. Leave the token empty when done.");

        loop {
            let Some(token) = self.select_token(&tokens, "Token: ").await? else {
                break;
            };
            let Some(amount) = self.read_amount(&token).await? else {
                continue;
            };
            let Some(recipient) = self.read_address("Recipient: ").await? else {
                continue;
            };
            selections.push(AmountSelection {
                token_address: token.address,
                amount,
                decimals: token.decimals,
                name: token.symbol.clone(),
                symbol: token.symbol,
                recipient_address: recipient,
            });
        }

        Ok((!selections.is_empty()).then_some(selections))
    }

    async fn select_swap(&self, intent: TransactionIntent) -> Result<Option<SwapSelection>> {
        let tokens = self.tokens_for(intent);
        let Some(sell) = self.select_token(&tokens, "Sell token: ").await? else {
            return Ok(None);
        };
        let Some(buy) = self.select_token(&tokens, "Buy token: ").await? else {
            return Ok(None);
        };
        if sell.address == buy.address {
            println!("Pick two different tokens.");
            return Ok(None);
        }
        let Some(sell_amount) = self.read_amount(&sell).await? else {
            return Ok(None);
        };

        Ok(Some(SwapSelection {
            sell_token_address: sell.address,
            buy_token_address: buy.address,
            sell_amount,
            sell_decimals: sell.decimals,
            sell_symbol: sell.symbol,
            buy_symbol: buy.symbol,
        }))
    }

    async fn password(&self, prompt: &str) -> Result<Option<Zeroizing<String>>> {
        self.input.read_password(prompt).await
    }

    async fn confirm(&self, message: &str) -> Result<bool> {
        self.input.read_yes_no(message).await
    }

    async fn select_fee_mode(&self, modes: &[FeeMode]) -> Result<Option<FeeMode>> {
        println!("How should gas be paid?");
        for (i, mode) in modes.iter().enumerate() {
            println!("  {}) {}", i + 1, mode);
        }
        let choice = self
            .input
            .read_choice("Fee mode (empty to go back): ", modes.len())
            .await?;
        Ok(choice.map(|i| modes[i]))
    }

    async fn select_fee_token(&self, _chain: &ChainConfig) -> Result<Option<Address>> {
        println!("Pay the broadcaster in:");
        let token = self
            .select_token(&self.tokens, "Fee token (empty to go back): ")
            .await?;
        Ok(token.map(|t| t.address))
    }

    async fn confirm_broadcaster(
        &self,
        offer: &SelectedBroadcaster,
        fee_token: &TokenInfo,
    ) -> Result<bool> {
        println!(
            "Broadcaster {} charges {} {} per unit of gas.",
            offer.broadcaster_address.abbreviated(),
            offer.fee_per_unit_gas.format_units(fee_token.decimals),
            fee_token.symbol
        );
        if !offer.supports_relay_adapt {
            println!("It cannot relay swaps or base-token unshields.");
        }
        self.input.read_yes_no("Use this broadcaster?").await
    }

    async fn select_signer(&self, signers: &[PublicSigner]) -> Result<Option<PublicSigner>> {
        println!("Sign and pay gas with:");
        for (i, signer) in signers.iter().enumerate() {
            println!("  {}) {}", i + 1, signer);
        }
        let choice = self
            .input
            .read_choice("Wallet (empty to go back): ", signers.len())
            .await?;
        Ok(choice.map(|i| signers[i].clone()))
    }

    fn show_progress(&self, progress: &ProofProgress) {
        let mut stdout = std::io::stdout();
        let line = format!("Building proof {}", progress);
        if execute!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line)).is_err() {
            return;
        }
        if progress.percent >= 100.0 {
            println!();
        }
        let _ = stdout.flush();
    }

    fn notify(&self, message: &str) {
        println!("! {}", message);
    }
}
