use crate::game::{describe_ack, ClientGridState};
use crate::input::{parse_command, Command, InputManager, HELP};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientFrame, ServerEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct Client {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    state: ClientGridState,
    input: InputManager,
}

impl Client {
    pub async fn new(server_url: &str, player_id: &str) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Connecting to {}...", server_url);
        let (ws, _response) = connect_async(server_url).await?;
        let (write, read) = ws.split();

        Ok(Client {
            write,
            read,
            state: ClientGridState::new(),
            input: InputManager::new(player_id),
        })
    }

    async fn send_frame(&mut self, frame: &ClientFrame) -> Result<(), Box<dyn std::error::Error>> {
        let text = serde_json::to_string(frame)?;
        self.write.send(Message::Text(text)).await?;
        Ok(())
    }

    fn handle_event(&mut self, event: ServerEvent) {
        if let ServerEvent::Ack(payload) = &event {
            println!("{}", describe_ack(&payload.result));
            return;
        }

        let first_init = matches!(event, ServerEvent::Init(_)) && !self.state.initialized;
        if let ServerEvent::OnlineCount(count) = &event {
            debug!("Online count: {}", count);
        }

        if self.state.apply_event(&event) {
            println!("{}", self.state.render());
        }
        if first_init {
            println!("{}", self.state.policy_description());
            println!("{}", HELP);
        }
    }

    /// Handles one line of user input. Returns false when the user quits.
    async fn handle_line(&mut self, line: &str) -> Result<bool, Box<dyn std::error::Error>> {
        match parse_command(line) {
            Ok(Command::Submit { row, col, ch }) => {
                let frame = self.input.submit_frame(row, col, &ch);
                self.send_frame(&frame).await?;
            }
            Ok(Command::Show) => println!("{}", self.state.render()),
            Ok(Command::Help) => println!("{}", HELP),
            Ok(Command::Quit) => return Ok(false),
            Err(message) => println!("{}", message),
        }
        Ok(true)
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Playing as {}", self.input.player_id());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                frame = self.read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ServerEvent>(&text) {
                                Ok(event) => self.handle_event(event),
                                Err(e) => warn!("Failed to decode server frame: {}", e),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("Connection error: {}", e);
                            break;
                        }
                    }
                },

                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !self.handle_line(&line).await? {
                                break;
                            }
                        }
                        None => break,
                    }
                },
            }
        }

        if let Err(e) = self.write.close().await {
            debug!("Error closing connection: {}", e);
        }

        Ok(())
    }
}
