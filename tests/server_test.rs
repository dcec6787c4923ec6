//! End-to-end tests over a real `TcpListener`, one connection per message.
//! Relative proof-of-work comparisons (eviction) are
//! exercised at the `Admission` unit level instead, where hash-independent
//! "crafted" messages make the ordering deterministic without running a
//! miner; here we only assert outcomes that don't depend on a real SHA-256
//! digest's numeric value.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use p2pim::net::Clock;
use p2pim::{miner, pow, Admission, Message};

async fn send(addr: std::net::SocketAddr, frame: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(frame.as_bytes()).await.unwrap();
    stream.shutdown().await.unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    reply
}

fn mined(payload: &str, ts: chrono::DateTime<Utc>) -> String {
    let mut m = Message::new();
    m.set_timestamp(Some(ts));
    m.set_payload(payload).unwrap();
    miner::mine(&mut m, pow::POW_MAX, Some(ts)).unwrap();
    m.wire()
}

async fn spawn_server(ts: chrono::DateTime<Utc>, mem: usize) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let engine = Rc::new(RefCell::new(Admission::new(mem, true)));
    tokio::task::spawn_local(p2pim::net::connection::serve(listener, engine, Clock::Fixed(ts)));
    addr
}

#[tokio::test(flavor = "current_thread")]
async fn accepts_and_stores_a_well_formed_message() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
            let addr = spawn_server(ts, 4096).await;

            let frame = mined("hello world", ts);
            let reply = send(addr, &frame).await;
            assert_eq!(reply, "ok\n");

            let listing = send(addr, &mined("__messages__", ts)).await;
            assert!(listing.contains("hello world"));
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn rejects_a_future_timestamped_message() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let now = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
            let addr = spawn_server(now, 4096).await;

            let future = now + chrono::Duration::seconds(1);
            let frame = mined("late", future);
            let reply = send(addr, &frame).await;
            assert_eq!(reply, "Datetime in future\n");
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn rejects_a_tampered_checksum() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
            let addr = spawn_server(ts, 4096).await;

            let frame = mined("hello world", ts);
            let tampered = frame[..frame.len() - 3].to_string() + "X\"]";
            let reply = send(addr, &tampered).await;
            assert_eq!(reply, "Wrong checksum\n");
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn info_reports_the_current_watermark_without_storing() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
            let addr = spawn_server(ts, 4096).await;

            let reply = send(addr, &mined("__info__", ts)).await;
            assert_eq!(reply, format!("Required pow: 0x{:08x}\n", pow::POW_MAX));

            let listing = send(addr, &mined("__messages__", ts)).await;
            assert_eq!(listing, "");
        })
        .await;
}
