//! Server binary: accepts one message per TCP
//! connection, admits it through [`p2pim::Admission`], replies, closes.

use std::cell::RefCell;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeZone, Utc};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use p2pim::admission::Admission;
use p2pim::error::ConfigError;
use p2pim::net::Clock;

/// Wire-protocol instant-messaging server rate-limited by proof of work.
#[derive(Parser, Debug)]
#[command(name = "p2pim-server")]
struct Args {
    /// Store capacity in bytes.
    #[arg(long, default_value_t = 128)]
    mem: i64,

    /// Address to bind to.
    #[arg(long, default_value = "127.0.0.1")]
    addr: String,

    /// Port to bind to.
    #[arg(long, default_value_t = 8765)]
    port: u16,

    /// Fix the server's notion of "now" (YYYYMMDDhhmmss). Also unlocks the
    /// `__exit__` and `__memory__` control payloads.
    #[arg(long)]
    current_time: Option<String>,
}

struct Config {
    mem: usize,
    addr: Ipv4Addr,
    port: u16,
    clock: Clock,
}

impl Args {
    fn into_config(self) -> Result<Config, ConfigError> {
        if self.mem <= 0 {
            return Err(ConfigError::NonPositiveMem);
        }
        let addr = Ipv4Addr::from_str(&self.addr)
            .map_err(|_| ConfigError::BadCurrentTime(format!("bad --addr {}", self.addr)))?;
        let clock = match self.current_time {
            None => Clock::Live,
            Some(s) => {
                let naive = NaiveDateTime::parse_from_str(&s, "%Y%m%d%H%M%S")
                    .map_err(|_| ConfigError::BadCurrentTime(s.clone()))?;
                Clock::Fixed(Utc.from_utc_datetime(&naive))
            }
        };
        Ok(Config {
            mem: self.mem as usize,
            addr,
            port: self.port,
            clock,
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Args::parse().into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .expect("failed to build tokio runtime");

    let local = tokio::task::LocalSet::new();
    local.block_on(&rt, async move {
        let listener = TcpListener::bind((config.addr, config.port))
            .await
            .unwrap_or_else(|e| panic!("failed to bind {}:{}: {e}", config.addr, config.port));
        info!("listening on {}:{}", config.addr, config.port);

        let engine = Rc::new(RefCell::new(Admission::new(
            config.mem,
            config.clock.is_test_mode(),
        )));
        p2pim::net::connection::serve(listener, engine, config.clock).await;
    });
}
