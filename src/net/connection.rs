//! Connection handler: one message per TCP connection.
//!
//! Reads the client's half of the stream to EOF, hands the accumulated
//! bytes to the verifier and admission engine, writes a single reply, and
//! closes. The admission critical section (verify + admit) never awaits —
//! it runs to completion between the read and the write, so concurrent
//! connections on the same `LocalSet` never interleave an admission
//! decision with another one.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::admission::{Admission, AdmissionOutcome};
use crate::net::Clock;
use crate::verify;

/// Accepts connections forever, spawning one `!Send`-friendly task per
/// connection onto the current `LocalSet`: a single cooperative event
/// loop, no shared-memory parallelism between tasks.
pub async fn serve(listener: TcpListener, engine: Rc<RefCell<Admission>>, clock: Clock) {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };
        debug!("accepted connection from {peer}");
        let engine = Rc::clone(&engine);
        tokio::task::spawn_local(async move {
            if let Err(e) = handle_connection(socket, engine, clock).await {
                warn!("connection with {peer} failed: {e}");
            }
        });
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    engine: Rc<RefCell<Admission>>,
    clock: Clock,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    socket.read_to_end(&mut buf).await?;
    let frame = String::from_utf8_lossy(&buf);

    let now = clock.now();
    let required_pow = engine.borrow().required_pow();

    let (reply, should_exit) = match verify::verify(&frame, required_pow, Some(now)) {
        Ok(message) => match engine.borrow_mut().admit(message, now) {
            AdmissionOutcome::Reply(s) => (s, false),
            AdmissionOutcome::Exit(s) => (s, true),
        },
        Err(e) => (format!("{e}\n"), false),
    };

    socket.write_all(reply.as_bytes()).await?;
    socket.flush().await?;
    socket.shutdown().await?;

    if should_exit {
        info!("exiting on __exit__ control payload (test mode)");
        std::process::exit(0);
    }
    Ok(())
}
