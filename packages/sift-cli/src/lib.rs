use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
		.invalid(AnsiColor::Yellow.on_default())
}

/// Value parser for free-text arguments that must contain something besides whitespace.
pub fn non_blank(raw: &str) -> Result<String, String> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Err("must not be blank".to_string());
	}

	Ok(trimmed.to_string())
}
