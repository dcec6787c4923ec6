//! Generator binary: mines and prints one wire-form
//! message per line for each payload given on the command line.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use clap::Parser;

use p2pim::error::ConfigError;
use p2pim::pow;

/// Mines proof-of-work messages and prints their wire form to stdout.
#[derive(Parser, Debug)]
#[command(name = "p2pim-generate")]
struct Args {
    /// Payloads to emit, one message per payload. Defaults to `__info__`.
    message: Vec<String>,

    /// Override the wall clock used for age computation during mining
    /// (YYYYMMDDhhmmss).
    #[arg(long)]
    current_time: Option<String>,

    /// Override the timestamp embedded in emitted messages (YYYYMMDDhhmmss).
    #[arg(long)]
    message_time: Option<String>,

    /// 8-hex-character upper bound on `initial_pow`.
    #[arg(long, default_value = "ffffffff")]
    pow: String,

    /// Target message lifetime in seconds.
    #[arg(long, default_value_t = 10)]
    duration: i64,

    /// Append `, init PoW: <hex> current PoW: <hex>` to each line.
    #[arg(long)]
    debug: bool,
}

struct Config {
    payloads: Vec<String>,
    current_time: Option<DateTime<Utc>>,
    message_time: Option<DateTime<Utc>>,
    required_pow: u32,
    duration: i64,
    debug: bool,
}

fn parse_timestamp(s: &str, err: impl Fn(String) -> ConfigError) -> Result<DateTime<Utc>, ConfigError> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S").map_err(|_| err(s.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive))
}

impl Args {
    fn into_config(self) -> Result<Config, ConfigError> {
        if self.duration <= 0 {
            return Err(ConfigError::NonPositiveDuration);
        }
        let required_pow = u32::from_str_radix(&self.pow, 16)
            .map_err(|_| ConfigError::BadPow(self.pow.clone()))?;
        let current_time = self
            .current_time
            .as_deref()
            .map(|s| parse_timestamp(s, ConfigError::BadCurrentTime))
            .transpose()?;
        let message_time = self
            .message_time
            .as_deref()
            .map(|s| parse_timestamp(s, ConfigError::BadMessageTime))
            .transpose()?;
        let payloads = if self.message.is_empty() {
            vec!["__info__".to_string()]
        } else {
            self.message
        };
        Ok(Config {
            payloads,
            current_time,
            message_time,
            required_pow,
            duration: self.duration,
            debug: self.debug,
        })
    }
}

/// Scales `--pow` down by the age ratio the message will have grown by at
/// `--duration` seconds old, so its `current_pow` still sits within the
/// original bound: `floor(W / (max(duration, min_age) / min_age))`. At the
/// default `--duration` (== `min_age`) the ratio is `1.0` and the threshold
/// is unchanged.
fn effective_pow(requested: u32, duration: i64) -> u32 {
    let min_age = pow::MIN_MESSAGE_AGE_SECS as f64;
    let duration = duration.max(pow::MIN_MESSAGE_AGE_SECS) as f64;
    let age_ratio = duration / min_age;
    (requested as f64 / age_ratio).floor() as u32
}

fn main() {
    let config = match Args::parse().into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mining_threshold = effective_pow(config.required_pow, config.duration);

    for payload in &config.payloads {
        let mut message = p2pim::Message::new();
        message.set_timestamp(config.message_time);
        if let Err(e) = message.set_payload(payload.as_str()) {
            eprintln!("{e}");
            std::process::exit(1);
        }
        if let Err(e) = p2pim::miner::mine(&mut message, mining_threshold, config.current_time) {
            eprintln!("{e}");
            std::process::exit(1);
        }

        if config.debug {
            println!(
                "{}, init PoW: {:08x} current PoW: {:08x}",
                message.wire(),
                message.initial_pow.expect("mine() sets initial_pow"),
                message.current_pow.expect("update_pow just set this"),
            );
        } else {
            println!("{}", message.wire());
        }
    }
}
