pub mod line_input;
pub mod terminal_prompter;
