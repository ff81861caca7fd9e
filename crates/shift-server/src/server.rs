//! WebSocket server and connection handling.
//!
//! Each connection runs on its own task but never touches room state. Parsed
//! intents are forwarded to a single dispatcher task that owns the
//! [`Authority`], so moves are validated one at a time in arrival order.

use crate::authority::{Authority, Envelope};
use crate::config::ServerConfig;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use shift_core::{ClientMessage, ConnectionId, RejectReason, ServerMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events delivered to the dispatcher
#[derive(Debug)]
pub enum Inbound {
    Message {
        from: ConnectionId,
        msg: ClientMessage,
    },
    /// A text frame that is not a valid intent
    Malformed {
        from: ConnectionId,
        error: String,
    },
    Disconnected {
        from: ConnectionId,
    },
    /// Drop every room and stop dispatching
    Shutdown,
}

/// Outgoing message queues keyed by connection
pub type Outboxes = Arc<DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>>;

/// Server state shared across all connections.
pub struct ServerState {
    /// Mapping from connection ID to its outgoing message queue
    pub outboxes: Outboxes,
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl ServerState {
    pub fn new(inbound: mpsc::UnboundedSender<Inbound>) -> Self {
        Self {
            outboxes: Arc::new(DashMap::new()),
            inbound,
        }
    }

    fn forward(&self, event: Inbound) {
        if self.inbound.send(event).is_err() {
            warn!("dispatcher stopped; dropping inbound event");
        }
    }
}

/// Run the WebSocket server until Ctrl-C.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Shift Tac Toe server listening");

    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let state = Arc::new(ServerState::new(inbound_tx));
    let authority = Authority::new(&config);
    let dispatcher = tokio::spawn(dispatch(
        authority,
        inbound_rx,
        Arc::clone(&state.outboxes),
    ));

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer_addr, state).await {
                            error!("Connection error from {}: {}", peer_addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    state.forward(Inbound::Shutdown);
    if let Err(e) = dispatcher.await {
        error!("Dispatcher task failed: {}", e);
    }
    // Dropping every outbox ends the forward tasks, which close their sockets
    state.outboxes.clear();
    info!("Server stopped");
    Ok(())
}

/// Owns the authority and applies inbound events strictly in order
async fn dispatch(
    mut authority: Authority,
    mut inbound: mpsc::UnboundedReceiver<Inbound>,
    outboxes: Outboxes,
) {
    while let Some(event) = inbound.recv().await {
        let envelopes = match event {
            Inbound::Message { from, msg } => authority.handle(from, msg),
            Inbound::Malformed { from, error } => vec![Envelope::new(
                from,
                ServerMessage::Rejected {
                    reason: RejectReason::MalformedIntent(error),
                },
            )],
            Inbound::Disconnected { from } => authority.disconnect(from),
            Inbound::Shutdown => break,
        };
        deliver(&outboxes, envelopes);
    }

    let dropped = authority.shutdown();
    info!(rooms = dropped, "dispatcher stopped");
}

/// Decode one text frame from `from` into a dispatcher event
fn decode_frame(from: ConnectionId, text: &str) -> Inbound {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => Inbound::Message { from, msg },
        Err(e) => Inbound::Malformed {
            from,
            error: e.to_string(),
        },
    }
}

fn deliver(outboxes: &Outboxes, envelopes: Vec<Envelope>) {
    for Envelope { to, message } in envelopes {
        if let Some(sender) = outboxes.get(&to) {
            let _ = sender.send(message);
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let connection_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.outboxes.insert(connection_id, tx);

    let welcome = ServerMessage::Welcome { connection_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to encode outgoing message: {}", e),
            }
        }
        let _ = ws_sender.close().await;
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let event = decode_frame(connection_id, &text);
                match &event {
                    Inbound::Message { msg, .. } => {
                        debug!(connection = %connection_id, ?msg, "intent received");
                    }
                    Inbound::Malformed { error, .. } => {
                        warn!("Invalid message from {}: {} ({})", connection_id, text, error);
                    }
                    _ => {}
                }
                state.forward(event);
            }
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", connection_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    state.forward(Inbound::Disconnected {
        from: connection_id,
    });
    state.outboxes.remove(&connection_id);
    send_task.abort();

    info!("Connection closed for {}", connection_id);
    Ok(())
}
