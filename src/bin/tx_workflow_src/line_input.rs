//! Line-oriented terminal input.

use std::io::Write;

use anyhow::Context;
use anyhow::Result;
use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::terminal;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::io::Lines;
use tokio::io::Stdin;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

#[derive(Debug)]
pub struct LineInput {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Default for LineInput {
    fn default() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl LineInput {
    /// print `prompt` and read one trimmed line. `None` at end of input.
    pub async fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        let line = self.lines.lock().await.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    /// read a line, treating an empty answer as `None`
    pub async fn read_answer(&self, prompt: &str) -> Result<Option<String>> {
        Ok(self.read_line(prompt).await?.filter(|l| !l.is_empty()))
    }

    /// ask until the answer is `y` or `n`
    pub async fn read_yes_no(&self, prompt: &str) -> Result<bool> {
        loop {
            match self.read_line(&format!("{} [y/n] ", prompt)).await? {
                None => return Ok(false),
                Some(answer) => match answer.to_lowercase().as_str() {
                    "y" | "yes" => return Ok(true),
                    "n" | "no" => return Ok(false),
                    _ => println!("Please answer y or n."),
                },
            }
        }
    }

    /// read a 1-based choice among `len` items. `None` if the answer is empty.
    pub async fn read_choice(&self, prompt: &str, len: usize) -> Result<Option<usize>> {
        loop {
            let Some(answer) = self.read_answer(prompt).await? else {
                return Ok(None);
            };
            match answer.parse::<usize>() {
                Ok(n) if (1..=len).contains(&n) => return Ok(Some(n - 1)),
                _ => println!("Enter a number between 1 and {}.", len),
            }
        }
    }

    /// read a password without echo. `None` if the user presses escape.
    ///
    /// holds the stdin lock while the terminal is in raw mode so no line read
    /// competes for input.
    pub async fn read_password(&self, prompt: &str) -> Result<Option<Zeroizing<String>>> {
        let _guard = self.lines.lock().await;
        print!("{}: ", prompt);
        std::io::stdout().flush()?;

        let password = tokio::task::spawn_blocking(read_password_raw)
            .await
            .context("password reader panicked")??;
        println!();
        Ok(password)
    }
}

fn read_password_raw() -> Result<Option<Zeroizing<String>>> {
    terminal::enable_raw_mode()?;
    let result = read_keys();
    terminal::disable_raw_mode()?;
    result
}

fn read_keys() -> Result<Option<Zeroizing<String>>> {
    let mut password = Zeroizing::new(String::new());
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(Some(password)),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(None),
            KeyCode::Backspace => {
                password.pop();
            }
            KeyCode::Char(c) => password.push(c),
            _ => {}
        }
    }
}
