//! Websocket session manager for the QQ bot gateway.
//!
//! Owns the full lifecycle of every shard: connect, identify or resume,
//! heartbeat, and reconnect with backoff. Dispatch events are handed to the
//! registered [`EventHandlers`].

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use futures::{SinkExt, Stream, StreamExt};
use tokio::{sync::watch, time::Instant};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, error, info, instrument, warn};

use crate::base::types::{Res, Void};

use super::{
    api::{BotToken, GatewayBot},
    payload::{EventHandlers, HelloData, Intents, ReadyData, WsPayload, event, heartbeat_frame, identify_frame, opcode, resume_frame},
};

/// Pause between starting consecutive batches of shards.
pub const BATCH_INTERVAL: Duration = Duration::from_secs(5);

/// How long a fresh connection may take to send its hello frame.
pub const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

const MIN_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// Split shard IDs into batches that may be started at the same time.
pub fn shard_batches(shards: u32, max_concurrency: u32) -> Vec<Vec<u32>> {
    let size = max_concurrency.max(1) as usize;
    let ids = (0..shards.max(1)).collect::<Vec<_>>();

    ids.chunks(size).map(<[u32]>::to_vec).collect()
}

/// Delay before the next connection attempt: 1s doubling up to 60s.
pub fn reconnect_delay(attempt: u32) -> Duration {
    MIN_RECONNECT_DELAY.saturating_mul(2u32.saturating_pow(attempt)).min(MAX_RECONNECT_DELAY)
}

/// Close codes after which the shard must not reconnect.
pub fn is_fatal_close_code(code: u16) -> bool {
    // 4004: invalid token, 4914: bot offline (sandbox only), 4915: bot banned.
    matches!(code, 4004 | 4914 | 4915)
}

/// Close codes after which the session cannot be resumed.
fn close_invalidates_session(code: u16) -> bool {
    matches!(code, 4006 | 4007)
}

/// Resume state of one shard, kept across connections.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub session_id: Option<String>,
    pub last_seq: Option<u64>,
}

impl Session {
    fn resumable(&self) -> Option<(&str, u64)> {
        match (&self.session_id, self.last_seq) {
            (Some(id), Some(seq)) => Some((id.as_str(), seq)),
            _ => None,
        }
    }

    fn clear(&mut self) {
        self.session_id = None;
        self.last_seq = None;
    }
}

/// What the connection loop should do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    Continue,
    /// The session is (re)established.
    Ready,
    /// The gateway asked for an immediate heartbeat.
    Heartbeat,
    /// The gateway acknowledged our last heartbeat.
    HeartbeatAck,
    /// Drop the connection and resume on a new one.
    Reconnect,
    /// Drop the connection and identify from scratch.
    InvalidSession,
}

/// Apply one gateway frame to the shard's session.
pub fn handle_frame(session: &mut Session, handlers: &EventHandlers, payload: &WsPayload) -> FrameAction {
    if let Some(seq) = payload.s {
        session.last_seq = Some(seq);
    }

    match payload.op {
        opcode::DISPATCH => match payload.t.as_deref() {
            Some(event::READY) => match payload.data::<ReadyData>() {
                Ok(ready) => {
                    info!("Gateway session {} ready as {} ({})", ready.session_id, ready.user.username, ready.user.id);
                    session.session_id = Some(ready.session_id);
                    FrameAction::Ready
                }
                Err(err) => {
                    warn!("Malformed READY payload: {}", err);
                    session.clear();
                    FrameAction::InvalidSession
                }
            },
            Some(event::RESUMED) => {
                info!("Gateway session resumed.");
                FrameAction::Ready
            }
            Some(t) => {
                match handlers.dispatch(payload) {
                    Ok(true) => {}
                    Ok(false) => debug!("No handler for event {}", t),
                    Err(err) => warn!("Failed to handle event {}: {}", t, err),
                }
                FrameAction::Continue
            }
            None => FrameAction::Continue,
        },
        opcode::HEARTBEAT => FrameAction::Heartbeat,
        opcode::HEARTBEAT_ACK => FrameAction::HeartbeatAck,
        opcode::RECONNECT => {
            info!("Gateway requested a reconnect.");
            FrameAction::Reconnect
        }
        opcode::INVALID_SESSION => {
            warn!("Gateway reported an invalid session.");
            session.clear();
            FrameAction::InvalidSession
        }
        op => {
            debug!("Ignoring gateway frame with op {}", op);
            FrameAction::Continue
        }
    }
}

/// A decoded websocket message.
enum Incoming {
    Payload(WsPayload),
    Closed(Option<u16>),
    Ignored,
}

fn parse_message(message: Message) -> Res<Incoming> {
    match message {
        Message::Text(text) => Ok(Incoming::Payload(WsPayload::parse(text.as_str())?)),
        Message::Binary(bytes) => {
            let text = std::str::from_utf8(&bytes).context("Invalid utf-8 gateway payload")?;
            Ok(Incoming::Payload(WsPayload::parse(text)?))
        }
        Message::Close(frame) => Ok(Incoming::Closed(frame.map(|f| u16::from(f.code)))),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(Incoming::Ignored),
    }
}

/// How a single connection ended.
#[derive(Debug)]
enum ConnectionEnd {
    Shutdown,
    Reconnect,
    Fatal(String),
}

/// Everything a shard needs to connect, shared by all shards.
pub struct ShardContext {
    pub url: String,
    pub authorization: String,
    pub intents: Intents,
    pub shard_count: u32,
    pub handlers: EventHandlers,
    pub hello_timeout: Duration,
}

/// Starts and supervises the shards of one bot.
pub struct SessionManager {
    token: BotToken,
    handlers: EventHandlers,
}

impl SessionManager {
    pub fn new(token: BotToken, handlers: EventHandlers) -> Self {
        Self { token, handlers }
    }

    /// Run every shard the gateway asks for until `shutdown` flips or a shard fails for good.
    #[instrument(name = "SessionManager::start", skip_all)]
    pub async fn start(&self, gateway: GatewayBot, mut shutdown: watch::Receiver<bool>) -> Void {
        let limit = &gateway.session_start_limit;
        let shard_count = gateway.shards.max(1);

        if limit.remaining < shard_count {
            return Err(anyhow::anyhow!(
                "Session start limit exhausted ({} of {} remaining, resets in {} ms).",
                limit.remaining,
                limit.total,
                limit.reset_after
            ));
        }

        let context = Arc::new(ShardContext {
            url: gateway.url.clone(),
            authorization: self.token.authorization(),
            intents: self.handlers.intents(),
            shard_count,
            handlers: self.handlers.clone(),
            hello_timeout: HELLO_TIMEOUT,
        });

        info!("Starting {} shard(s) against {} ...", shard_count, gateway.url);

        let mut tasks = Vec::new();

        for (index, batch) in shard_batches(shard_count, limit.max_concurrency).into_iter().enumerate() {
            if index > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(BATCH_INTERVAL) => {}
                    _ = shutdown.changed() => break,
                }
            }

            for shard_id in batch {
                tasks.push(tokio::spawn(run_shard(context.clone(), shard_id, shutdown.clone())));
            }
        }

        let mut result = Ok(());

        for joined in futures::future::join_all(tasks).await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    if result.is_ok() {
                        result = Err(err);
                    }
                }
                Err(err) => error!("Shard task panicked: {}", err),
            }
        }

        result
    }
}

/// Keep one shard connected until shutdown or a fatal close.
#[instrument(skip(context, shutdown))]
pub async fn run_shard(context: Arc<ShardContext>, shard_id: u32, mut shutdown: watch::Receiver<bool>) -> Void {
    let mut session = Session::default();
    let mut attempts = 0u32;

    loop {
        if *shutdown.borrow() {
            break;
        }

        match run_connection(&context, shard_id, &mut session, &mut shutdown, &mut attempts).await {
            Ok(ConnectionEnd::Shutdown) => break,
            Ok(ConnectionEnd::Fatal(reason)) => {
                error!("Shard {} stopped: {}", shard_id, reason);
                return Err(anyhow::anyhow!("Shard {} stopped: {}", shard_id, reason));
            }
            Ok(ConnectionEnd::Reconnect) => info!("Shard {} reconnecting ...", shard_id),
            Err(err) => warn!("Shard {} connection error: {:#}", shard_id, err),
        }

        let delay = reconnect_delay(attempts);
        attempts = attempts.saturating_add(1);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }

    info!("Shard {} shut down.", shard_id);

    Ok(())
}

async fn run_connection(context: &ShardContext, shard_id: u32, session: &mut Session, shutdown: &mut watch::Receiver<bool>, attempts: &mut u32) -> Res<ConnectionEnd> {
    let (stream, _response) = connect_async(context.url.as_str()).await.context("Failed to connect to the gateway")?;
    let (mut sink, mut source) = stream.split();

    // Wait for the hello frame.

    let hello = match tokio::time::timeout(context.hello_timeout, wait_for_hello(&mut source, session)).await {
        Ok(Handshake::Hello(hello)) => hello,
        Ok(Handshake::Ended(end)) => return Ok(end),
        Ok(Handshake::Failed(err)) => return Err(err),
        Err(_) => {
            warn!("Shard {} got no hello within {:?}", shard_id, context.hello_timeout);
            return Ok(ConnectionEnd::Reconnect);
        }
    };

    // Identify, or resume where the last connection left off.

    let handshake = match session.resumable() {
        Some((session_id, seq)) => {
            info!("Shard {} resuming session {} at seq {}", shard_id, session_id, seq);
            resume_frame(&context.authorization, session_id, seq)
        }
        None => {
            info!("Shard {} identifying ...", shard_id);
            identify_frame(&context.authorization, context.intents, shard_id, context.shard_count)
        }
    };

    sink.send(Message::text(handshake)).await?;

    let period = Duration::from_millis(hello.heartbeat_interval.max(1000));
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    let mut awaiting_ack = false;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                return Ok(ConnectionEnd::Shutdown);
            }
            _ = heartbeat.tick() => {
                if awaiting_ack {
                    warn!("Shard {} missed a heartbeat ack.", shard_id);
                    return Ok(ConnectionEnd::Reconnect);
                }

                sink.send(Message::text(heartbeat_frame(session.last_seq))).await?;
                awaiting_ack = true;
            }
            message = source.next() => {
                let Some(message) = message else {
                    return Ok(ConnectionEnd::Reconnect);
                };

                match parse_message(message?)? {
                    Incoming::Payload(payload) => match handle_frame(session, &context.handlers, &payload) {
                        FrameAction::Continue => {}
                        FrameAction::Ready => *attempts = 0,
                        FrameAction::Heartbeat => sink.send(Message::text(heartbeat_frame(session.last_seq))).await?,
                        FrameAction::HeartbeatAck => awaiting_ack = false,
                        FrameAction::Reconnect | FrameAction::InvalidSession => return Ok(ConnectionEnd::Reconnect),
                    },
                    Incoming::Closed(code) => return Ok(closed(code, session)),
                    Incoming::Ignored => {}
                }
            }
        }
    }
}

/// Outcome of waiting for the hello frame.
enum Handshake {
    Hello(HelloData),
    Ended(ConnectionEnd),
    Failed(anyhow::Error),
}

async fn wait_for_hello<S>(source: &mut S, session: &mut Session) -> Handshake
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let Some(message) = source.next().await else {
            return Handshake::Ended(ConnectionEnd::Reconnect);
        };

        let incoming = match message.map_err(anyhow::Error::from).and_then(parse_message) {
            Ok(incoming) => incoming,
            Err(err) => return Handshake::Failed(err),
        };

        match incoming {
            Incoming::Payload(payload) if payload.op == opcode::HELLO => {
                return match payload.data::<HelloData>() {
                    Ok(hello) => Handshake::Hello(hello),
                    Err(err) => Handshake::Failed(err),
                };
            }
            Incoming::Payload(payload) => debug!("Ignoring op {} before hello", payload.op),
            Incoming::Closed(code) => return Handshake::Ended(closed(code, session)),
            Incoming::Ignored => {}
        }
    }
}

fn closed(code: Option<u16>, session: &mut Session) -> ConnectionEnd {
    match code {
        Some(code) if is_fatal_close_code(code) => ConnectionEnd::Fatal(format!("gateway closed the connection with code {code}")),
        Some(code) => {
            warn!("Gateway closed the connection with code {}", code);
            if close_invalidates_session(code) {
                session.clear();
            }
            ConnectionEnd::Reconnect
        }
        None => ConnectionEnd::Reconnect,
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::Mutex;

    const AT_MESSAGE: &str = r#"{"op":0,"s":2,"t":"AT_MESSAGE_CREATE","id":"AT_MESSAGE_CREATE:1","d":{"id":"m-1","channel_id":"1234567","guild_id":"7654321","content":"<@!1> hello","author":{"id":"9","username":"alice"}}}"#;

    fn frame(text: &str) -> WsPayload {
        WsPayload::parse(text).unwrap()
    }

    #[test]
    fn test_shard_batches() {
        assert_eq!(shard_batches(1, 1), vec![vec![0]]);
        assert_eq!(shard_batches(4, 1), vec![vec![0], vec![1], vec![2], vec![3]]);
        assert_eq!(shard_batches(5, 2), vec![vec![0, 1], vec![2, 3], vec![4]]);
        assert_eq!(shard_batches(3, 0), vec![vec![0], vec![1], vec![2]]);
        assert_eq!(shard_batches(0, 16), vec![vec![0]]);
    }

    #[test]
    fn test_reconnect_delay() {
        assert_eq!(reconnect_delay(0), Duration::from_secs(1));
        assert_eq!(reconnect_delay(1), Duration::from_secs(2));
        assert_eq!(reconnect_delay(5), Duration::from_secs(32));
        assert_eq!(reconnect_delay(6), Duration::from_secs(60));
        assert_eq!(reconnect_delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_fatal_close_codes() {
        assert!(is_fatal_close_code(4004));
        assert!(is_fatal_close_code(4914));
        assert!(is_fatal_close_code(4915));
        assert!(!is_fatal_close_code(4009));
        assert!(!is_fatal_close_code(1000));
    }

    #[test]
    fn test_ready_then_dispatch_tracks_session() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handlers = EventHandlers::new().with_at_message(move |_, data| sink.lock().unwrap().push(data.content));
        let mut session = Session::default();

        let ready = frame(r#"{"op":0,"s":1,"t":"READY","d":{"session_id":"sess-1","user":{"id":"1","username":"relay","bot":true}}}"#);

        assert_eq!(handle_frame(&mut session, &handlers, &ready), FrameAction::Ready);
        assert_eq!(session.resumable(), Some(("sess-1", 1)));

        assert_eq!(handle_frame(&mut session, &handlers, &frame(AT_MESSAGE)), FrameAction::Continue);
        assert_eq!(session.last_seq, Some(2));
        assert_eq!(*seen.lock().unwrap(), vec!["<@!1> hello".to_string()]);
    }

    #[test]
    fn test_control_frames() {
        let handlers = EventHandlers::new();
        let mut session = Session {
            session_id: Some("sess-1".to_string()),
            last_seq: Some(5),
        };

        assert_eq!(handle_frame(&mut session, &handlers, &frame(r#"{"op":11}"#)), FrameAction::HeartbeatAck);
        assert_eq!(handle_frame(&mut session, &handlers, &frame(r#"{"op":1,"d":null}"#)), FrameAction::Heartbeat);
        assert_eq!(handle_frame(&mut session, &handlers, &frame(r#"{"op":0,"s":6,"t":"RESUMED","d":""}"#)), FrameAction::Ready);
        assert_eq!(handle_frame(&mut session, &handlers, &frame(r#"{"op":7}"#)), FrameAction::Reconnect);
        assert_eq!(session.resumable(), Some(("sess-1", 6)));

        assert_eq!(handle_frame(&mut session, &handlers, &frame(r#"{"op":9,"d":false}"#)), FrameAction::InvalidSession);
        assert!(session.resumable().is_none());
    }

    #[test]
    fn test_malformed_ready_forces_identify() {
        let handlers = EventHandlers::new();
        let mut session = Session {
            session_id: Some("old".to_string()),
            last_seq: Some(5),
        };

        let broken = frame(r#"{"op":0,"s":1,"t":"READY","d":{"user":{}}}"#);

        assert_eq!(handle_frame(&mut session, &handlers, &broken), FrameAction::InvalidSession);
        assert!(session.resumable().is_none());
        assert!(session.session_id.is_none());
    }

    #[test]
    fn test_malformed_event_does_not_stop_the_loop() {
        let handlers = EventHandlers::new().with_at_message(|_, _| panic!("should not be called"));
        let mut session = Session::default();
        let broken = frame(r#"{"op":0,"s":3,"t":"AT_MESSAGE_CREATE","d":{"content":"no ids"}}"#);

        assert_eq!(handle_frame(&mut session, &handlers, &broken), FrameAction::Continue);
        assert_eq!(session.last_seq, Some(3));
    }

    #[test]
    fn test_close_codes_update_session() {
        let mut session = Session {
            session_id: Some("sess-1".to_string()),
            last_seq: Some(5),
        };

        assert!(matches!(closed(Some(4009), &mut session), ConnectionEnd::Reconnect));
        assert!(session.resumable().is_some());

        assert!(matches!(closed(Some(4007), &mut session), ConnectionEnd::Reconnect));
        assert!(session.resumable().is_none());

        assert!(matches!(closed(Some(4915), &mut session), ConnectionEnd::Fatal(_)));
    }

    #[tokio::test]
    async fn test_exhausted_session_limit_refuses_to_start() {
        let manager = SessionManager::new(BotToken::new(1, "t"), EventHandlers::new());
        let gateway: GatewayBot = serde_json::from_value(serde_json::json!({
            "url": "ws://127.0.0.1:1",
            "shards": 2,
            "session_start_limit": { "total": 1000, "remaining": 1, "reset_after": 1000, "max_concurrency": 1 }
        }))
        .unwrap();
        let (_tx, rx) = watch::channel(false);

        assert!(manager.start(gateway, rx).await.is_err());
    }

    #[tokio::test]
    async fn test_shard_identifies_and_dispatches() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            ws.send(Message::text(r#"{"op":10,"d":{"heartbeat_interval":45000}}"#)).await.unwrap();

            let identify = ws.next().await.unwrap().unwrap();
            let identify: Value = serde_json::from_str(identify.to_text().unwrap()).unwrap();

            ws.send(Message::text(r#"{"op":0,"s":1,"t":"READY","d":{"session_id":"sess-1","user":{"id":"1","username":"relay","bot":true}}}"#))
                .await
                .unwrap();
            ws.send(Message::text(AT_MESSAGE)).await.unwrap();

            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }

            identify
        });

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handlers = EventHandlers::new().with_at_message(move |_, data| {
            let _ = tx.send(data);
        });
        let context = ShardContext {
            url,
            authorization: BotToken::new(1, "t").authorization(),
            intents: handlers.intents(),
            shard_count: 1,
            handlers,
            hello_timeout: HELLO_TIMEOUT,
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shard = tokio::spawn(run_shard(Arc::new(context), 0, shutdown_rx));

        let data = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(data.channel_id, "1234567");

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), shard).await.unwrap().unwrap().unwrap();

        let identify = server.await.unwrap();
        assert_eq!(identify["op"], 2);
        assert_eq!(identify["d"]["token"], "Bot 1.t");
        assert_eq!(identify["d"]["intents"], 1u32 << 30);
        assert_eq!(identify["d"]["shard"], serde_json::json!([0, 1]));
    }

    fn silent_context(url: String, hello_timeout: Duration) -> Arc<ShardContext> {
        let handlers = EventHandlers::new().with_at_message(|_, _| {});

        Arc::new(ShardContext {
            url,
            authorization: BotToken::new(1, "t").authorization(),
            intents: handlers.intents(),
            shard_count: 1,
            handlers,
            hello_timeout,
        })
    }

    #[tokio::test]
    async fn test_missing_hello_triggers_reconnect() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            // First connection: upgrade, then stay silent.
            let (stream, _) = listener.accept().await.unwrap();
            let _silent = tokio_tungstenite::accept_async(stream).await.unwrap();

            // The shard gives up on it and dials again.
            let (stream, _) = listener.accept().await.unwrap();
            tokio_tungstenite::accept_async(stream).await.unwrap();
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shard = tokio::spawn(run_shard(silent_context(url, Duration::from_millis(200)), 0, shutdown_rx));

        tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap();

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), shard).await.unwrap().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_missed_heartbeat_ack_resumes_on_new_connection() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            // First connection: ready, then never ack a heartbeat.
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            ws.send(Message::text(r#"{"op":10,"d":{"heartbeat_interval":1000}}"#)).await.unwrap();
            ws.next().await.unwrap().unwrap();
            ws.send(Message::text(r#"{"op":0,"s":3,"t":"READY","d":{"session_id":"sess-1","user":{"id":"1","username":"relay"}}}"#))
                .await
                .unwrap();

            let mut heartbeats = 0;
            while let Some(Ok(message)) = ws.next().await {
                if message.is_text() {
                    heartbeats += 1;
                }
            }

            // Second connection must resume the session.
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            ws.send(Message::text(r#"{"op":10,"d":{"heartbeat_interval":45000}}"#)).await.unwrap();
            let resume = ws.next().await.unwrap().unwrap();

            (heartbeats, serde_json::from_str::<Value>(resume.to_text().unwrap()).unwrap())
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shard = tokio::spawn(run_shard(silent_context(url, HELLO_TIMEOUT), 0, shutdown_rx));

        let (heartbeats, resume) = tokio::time::timeout(Duration::from_secs(10), server).await.unwrap().unwrap();

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), shard).await.unwrap().unwrap().unwrap();

        assert_eq!(heartbeats, 1);
        assert_eq!(resume["op"], 6);
        assert_eq!(resume["d"]["session_id"], "sess-1");
        assert_eq!(resume["d"]["seq"], 3);
    }
}
