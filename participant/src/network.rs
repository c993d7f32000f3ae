use crate::player::Player;
use log::{debug, info, warn};
use serde_json::Value;
use shared::{Frame, GameInfo, ResetReason, Rpc, RpcCommand};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum ParticipantError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message from supervisor: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("cannot encode {0} command")]
    Encode(&'static str),
}

/// Splits the supervisor's back-to-back JSON objects into values.
#[derive(Debug, Default)]
pub struct JsonStream {
    buffer: Vec<u8>,
}

impl JsonStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Appends `data` and returns every complete value. A value cut off at
    /// the end stays buffered for the next call; any other syntax error
    /// discards the buffer.
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<Value>, serde_json::Error> {
        self.buffer.extend_from_slice(data);

        let mut values = Vec::new();
        let mut stream = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Value>();
        let consumed = loop {
            match stream.next() {
                Some(Ok(value)) => values.push(value),
                Some(Err(e)) if e.is_eof() => break stream.byte_offset(),
                Some(Err(e)) => {
                    self.buffer.clear();
                    return Err(e);
                }
                None => break stream.byte_offset(),
            }
        };

        self.buffer.drain(..consumed);
        Ok(values)
    }
}

/// What a participant saw of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchSummary {
    pub frames: u64,
    /// `[mine, opponent]` as of the last frame.
    pub score: [u32; 2],
    pub finished: bool,
}

pub struct Participant<P> {
    stream: TcpStream,
    key: String,
    decoder: JsonStream,
    player: P,
    info: Option<GameInfo>,
    summary: MatchSummary,
}

impl<P: Player> Participant<P> {
    pub async fn connect(addr: &str, key: &str, player: P) -> Result<Self, ParticipantError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        info!("Connected to supervisor at {}", addr);

        Ok(Participant {
            stream,
            key: key.to_string(),
            decoder: JsonStream::new(),
            player,
            info: None,
            summary: MatchSummary::default(),
        })
    }

    pub fn info(&self) -> Option<&GameInfo> {
        self.info.as_ref()
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    async fn send(&mut self, command: RpcCommand) -> Result<(), ParticipantError> {
        let name = command.name();
        let text = Rpc::new(self.key.as_str(), command)
            .encode()
            .ok_or(ParticipantError::Encode(name))?;
        self.stream.write_all(text.as_bytes()).await?;
        Ok(())
    }

    /// Requests the game info, reports ready and answers every frame until
    /// the match ends or the supervisor hangs up.
    pub async fn run(&mut self) -> Result<MatchSummary, ParticipantError> {
        self.send(RpcCommand::GetInfo).await?;

        let mut buffer = [0u8; 8192];
        loop {
            let len = self.stream.read(&mut buffer).await?;
            if len == 0 {
                warn!("Supervisor closed the connection");
                return Ok(self.summary);
            }

            for message in self.decoder.feed(&buffer[..len])? {
                if self.handle_message(message).await? {
                    return Ok(self.summary);
                }
            }
        }
    }

    /// Returns true once the match is over.
    async fn handle_message(&mut self, message: Value) -> Result<bool, ParticipantError> {
        if self.info.is_none() {
            let info: GameInfo = serde_json::from_value(message)?;
            info!(
                "Playing as {} against {}",
                info.team_info[0].name, info.team_info[1].name
            );
            self.player.init(&info);
            self.info = Some(info);
            self.send(RpcCommand::Ready).await?;
            return Ok(false);
        }

        let frame: Frame = serde_json::from_value(message)?;
        self.summary.frames += 1;
        self.summary.score = frame.score;

        match frame.reset_reason {
            ResetReason::GameEnd => {
                info!("Game over, final score {:?}", frame.score);
                self.player.finish(&frame);
                self.summary.finished = true;
                return Ok(true);
            }
            ResetReason::None => {}
            reason => debug!("Field reset at {:.2}s: {:?}", frame.time, reason),
        }

        if let Some(speeds) = self.player.update(&frame) {
            self.send(RpcCommand::SetSpeeds(speeds)).await?;
        }
        Ok(false)
    }
}
