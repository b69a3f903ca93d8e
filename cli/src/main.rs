
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::TimeZone;
use clap::{Args, Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use wire::{ChatMessage, ClientEvent, FileUpload, Inbound, MessageBody, ServerEvent, User};

const DEFAULT_API_URL: &str = "https://groupchat-with-payment.onrender.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ECHO_TIMEOUT: Duration = Duration::from_secs(15);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing auth token; pass --token or set GROUPCHAT_TOKEN")]
    MissingToken,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("connection refused: {0}")]
    ConnectRefused(String),
    #[error("packet decode failed: {0}")]
    Decode(#[from] wire::CodecError),
    #[error("timed out waiting for the server")]
    Timeout,
    #[error("file upload failed: {0}")]
    Upload(String),
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("{0}")]
    Input(&'static str),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

fn ws_error(error: tokio_tungstenite::tungstenite::Error) -> CliError {
    CliError::Ws(Box::new(error))
}

#[derive(Parser, Debug)]
#[command(name = "groupchat-cli", about = "Group chat API and channel CLI")]
struct Cli {
    #[arg(long, env = "GROUPCHAT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Chat channel base URL; defaults to the API URL.
    #[arg(long, env = "GROUPCHAT_SOCKET_URL")]
    socket_url: Option<String>,

    #[arg(long, env = "GROUPCHAT_TOKEN")]
    token: Option<String>,

    /// Raise log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    api_url: String,
    socket_url: String,
    token: Option<String>,
}

impl CliContext {
    fn token(&self) -> Result<&str, CliError> {
        self.token.as_deref().filter(|t| !t.is_empty()).ok_or(CliError::MissingToken)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check backend reachability.
    Health,
    /// Log in with email + password, then the emailed OTP. Prints the token.
    Login(CredentialArgs),
    /// Create an account, then verify the emailed OTP. Prints the token.
    Register {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Reset a forgotten password through the emailed OTP.
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    Me,
    Logout,
    Users,
    Profile(ProfileCommand),
    Payment(PaymentCommand),
    Chat(ChatCommand),
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(long)]
    email: String,
    /// Read from stdin when omitted.
    #[arg(long, env = "GROUPCHAT_PASSWORD")]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        name: String,
    },
    Picture {
        path: String,
    },
}

#[derive(Args, Debug)]
struct PaymentCommand {
    #[command(subcommand)]
    command: PaymentSubcommand,
}

#[derive(Subcommand, Debug)]
enum PaymentSubcommand {
    Status,
    History,
}

#[derive(Args, Debug)]
struct ChatCommand {
    #[command(subcommand)]
    command: ChatSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatSubcommand {
    /// Print message history.
    Messages {
        /// Only the newest N messages.
        #[arg(long)]
        limit: Option<usize>,
    },
    Online,
    Join,
    Leave,
    /// Stream live channel events until Ctrl-C.
    Tail {
        #[arg(long, help = "Stop after this many seconds")]
        for_secs: Option<u64>,
    },
    /// Send a text message and wait for its echo.
    Send {
        message: String,
        /// Use `POST /api/chat/send` instead of the channel.
        #[arg(long, default_value_t = false)]
        http: bool,
    },
    /// Upload a file to the channel and wait for its echo.
    Upload {
        path: String,
        #[arg(long, help = "MIME type; guessed from the extension when omitted")]
        mime: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let socket_url = cli.socket_url.unwrap_or_else(|| cli.api_url.clone());
    let ctx = CliContext {
        api_url: cli.api_url.trim_end_matches('/').to_owned(),
        socket_url: socket_url.trim_end_matches('/').to_owned(),
        token: cli.token,
    };

    match cli.command {
        Command::Health => print_json(&api_request(&ctx, reqwest::Method::GET, "/api/health", None).await?),
        Command::Login(credentials) => run_login(&ctx, credentials).await,
        Command::Register { name, credentials } => run_register(&ctx, name, credentials).await,
        Command::ForgotPassword { email } => run_forgot_password(&ctx, email).await,
        Command::Me => print_json(&api_request(&ctx, reqwest::Method::GET, "/api/auth/me", None).await?),
        Command::Logout => {
            let json = api_request(&ctx, reqwest::Method::POST, "/api/auth/logout", None).await?;
            eprintln!("{}", response_message(&json).unwrap_or("logged out"));
            Ok(())
        }
        Command::Users => print_json(&api_request(&ctx, reqwest::Method::GET, "/api/user/all", None).await?),
        Command::Profile(profile) => run_profile(&ctx, profile).await,
        Command::Payment(payment) => run_payment(&ctx, payment).await,
        Command::Chat(chat) => run_chat(&ctx, chat).await,
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();
}

// =============================================================
// Auth flows
// =============================================================

async fn run_login(ctx: &CliContext, credentials: CredentialArgs) -> Result<(), CliError> {
    let password = resolve_password(credentials.password)?;
    let body = serde_json::json!({ "email": credentials.email, "password": password });
    let sent = api_request(ctx, reqwest::Method::POST, "/api/auth/login", Some(body)).await?;
    eprintln!("{}", response_message(&sent).unwrap_or("OTP sent to your email"));
    verify_otp(ctx, &credentials.email).await
}

async fn run_register(ctx: &CliContext, name: String, credentials: CredentialArgs) -> Result<(), CliError> {
    let password = resolve_password(credentials.password)?;
    let body = serde_json::json!({
        "name": name,
        "email": credentials.email,
        "password": password,
        "confirmPassword": password,
    });
    let sent = api_request(ctx, reqwest::Method::POST, "/api/auth/register", Some(body)).await?;
    eprintln!("{}", response_message(&sent).unwrap_or("OTP sent to your email"));
    verify_otp(ctx, &credentials.email).await
}

async fn verify_otp(ctx: &CliContext, email: &str) -> Result<(), CliError> {
    let otp = prompt("OTP: ")?;
    if otp.is_empty() {
        return Err(CliError::Input("Please enter the OTP"));
    }
    let body = serde_json::json!({ "email": email, "otp": otp });
    let verified = api_request(ctx, reqwest::Method::POST, "/api/auth/verify-otp", Some(body)).await?;
    let token = verified
        .get("token")
        .and_then(Value::as_str)
        .ok_or(CliError::MissingField("token"))?;
    if let Some(name) = verified.pointer("/user/name").and_then(Value::as_str) {
        info!(%name, "signed in");
    }
    println!("{token}");
    Ok(())
}

async fn run_forgot_password(ctx: &CliContext, email: String) -> Result<(), CliError> {
    let sent = api_request(
        ctx,
        reqwest::Method::POST,
        "/api/auth/forgot-password",
        Some(serde_json::json!({ "email": email })),
    )
    .await?;
    eprintln!("{}", response_message(&sent).unwrap_or("OTP sent to your email"));

    let otp = prompt("OTP: ")?;
    if otp.is_empty() {
        return Err(CliError::Input("Please enter the OTP"));
    }
    api_request(
        ctx,
        reqwest::Method::POST,
        "/api/auth/verify-reset-otp",
        Some(serde_json::json!({ "email": email, "otp": otp })),
    )
    .await?;

    let password = prompt("New password: ")?;
    let confirm = prompt("Confirm password: ")?;
    if password.is_empty() || confirm.is_empty() {
        return Err(CliError::Input("Please fill in all fields"));
    }
    if password != confirm {
        return Err(CliError::Input("Passwords do not match"));
    }
    let reset = api_request(
        ctx,
        reqwest::Method::POST,
        "/api/auth/reset-password",
        Some(serde_json::json!({ "email": email, "otp": otp, "newPassword": password })),
    )
    .await?;
    eprintln!("{}", response_message(&reset).unwrap_or("Password reset successfully"));
    Ok(())
}

fn resolve_password(password: Option<String>) -> Result<String, CliError> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password: ")?,
    };
    if password.is_empty() {
        return Err(CliError::Input("Please fill in all fields"));
    }
    Ok(password)
}

fn prompt(label: &str) -> Result<String, CliError> {
    eprint!("{label}");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_owned())
}

// =============================================================
// Profile / payment
// =============================================================

async fn run_profile(ctx: &CliContext, profile: ProfileCommand) -> Result<(), CliError> {
    match profile.command {
        ProfileSubcommand::Show => {
            print_json(&api_request(ctx, reqwest::Method::GET, "/api/user/profile", None).await?)
        }
        ProfileSubcommand::Update { name } => {
            let name = name.trim().to_owned();
            if name.is_empty() {
                return Err(CliError::Input("Name is required"));
            }
            let json = api_request(
                ctx,
                reqwest::Method::PUT,
                "/api/user/profile",
                Some(serde_json::json!({ "name": name })),
            )
            .await?;
            print_json(&json)
        }
        ProfileSubcommand::Picture { path } => {
            let (bytes, file_name) = read_file(&path)?;
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(file_name.clone())
                .mime_str(guess_mime(&file_name))?;
            let form = reqwest::multipart::Form::new().part("profilePic", part);
            let request = http_client()?
                .put(format!("{}/api/user/profile/picture", ctx.api_url))
                .bearer_auth(ctx.token()?)
                .multipart(form);
            let json = read_response(request.send().await?).await?;
            print_json(&json)
        }
    }
}

async fn run_payment(ctx: &CliContext, payment: PaymentCommand) -> Result<(), CliError> {
    let path = match payment.command {
        PaymentSubcommand::Status => "/api/payment/status",
        PaymentSubcommand::History => "/api/payment/history",
    };
    print_json(&api_request(ctx, reqwest::Method::GET, path, None).await?)
}

// =============================================================
// Chat
// =============================================================

async fn run_chat(ctx: &CliContext, chat: ChatCommand) -> Result<(), CliError> {
    match chat.command {
        ChatSubcommand::Messages { limit } => {
            let json = api_request(ctx, reqwest::Method::GET, "/api/chat/messages", None).await?;
            let messages = history_messages(&json);
            let skip = limit.map_or(0, |limit| messages.len().saturating_sub(limit));
            for message in messages.iter().skip(skip) {
                println!("{}", render_message(message, &chrono::Local));
            }
            Ok(())
        }
        ChatSubcommand::Online => {
            print_json(&api_request(ctx, reqwest::Method::GET, "/api/chat/online-users", None).await?)
        }
        ChatSubcommand::Join => print_json(&api_request(ctx, reqwest::Method::POST, "/api/chat/join", None).await?),
        ChatSubcommand::Leave => {
            print_json(&api_request(ctx, reqwest::Method::POST, "/api/chat/leave", None).await?)
        }
        ChatSubcommand::Tail { for_secs } => chat_tail(ctx, for_secs).await,
        ChatSubcommand::Send { message, http } => {
            let message = message.trim().to_owned();
            if message.is_empty() {
                return Err(CliError::Input("message is empty"));
            }
            if http {
                let json = api_request(
                    ctx,
                    reqwest::Method::POST,
                    "/api/chat/send",
                    Some(serde_json::json!({ "message": message })),
                )
                .await?;
                return print_json(&json);
            }
            emit_and_wait(ctx, ClientEvent::SendMessage { message }, ECHO_TIMEOUT).await
        }
        ChatSubcommand::Upload { path, mime } => {
            let (bytes, file_name) = read_file(&path)?;
            let file_type = mime.unwrap_or_else(|| guess_mime(&file_name).to_owned());
            info!(%file_name, %file_type, size = bytes.len(), "uploading");
            let upload = FileUpload { file: STANDARD.encode(&bytes), file_name, file_type };
            emit_and_wait(ctx, ClientEvent::UploadFile(upload), UPLOAD_TIMEOUT).await
        }
    }
}

async fn chat_tail(ctx: &CliContext, for_secs: Option<u64>) -> Result<(), CliError> {
    let mut channel = Channel::open(ctx).await?;
    eprintln!("connected; streaming chat events");

    let stop = async {
        match for_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(stop);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            () = &mut stop => break,
            _ = &mut ctrl_c => break,
            inbound = channel.recv(None) => match inbound? {
                Inbound::Event(event) => println!("{}", render_event(&event, &chrono::Local)),
                Inbound::Closed | Inbound::Disconnected => return Err(CliError::WsClosed),
                _ => {}
            },
        }
    }

    channel.close().await;
    Ok(())
}

async fn emit_and_wait(ctx: &CliContext, event: ClientEvent, timeout: Duration) -> Result<(), CliError> {
    let me = signed_in_user(&api_request(ctx, reqwest::Method::GET, "/api/auth/me", None).await?)?;
    let channel = Channel::open(ctx).await?;
    let message = await_echo(channel, &event, &me.id, timeout).await?;
    println!("{}", render_message(&message, &chrono::Local));
    Ok(())
}

/// Emit `event` and wait for its echo. The channel is closed on every outcome.
async fn await_echo(
    mut channel: Channel,
    event: &ClientEvent,
    self_user_id: &str,
    timeout: Duration,
) -> Result<ChatMessage, CliError> {
    let outcome = match channel.send_text(event.encode()).await {
        Ok(()) => {
            debug!(event = event.name(), "emitted");
            tokio::time::timeout(timeout, async {
                loop {
                    match channel.recv(None).await? {
                        Inbound::Event(ServerEvent::NewMessage(message))
                            if matches_echo(&message, event, self_user_id) =>
                        {
                            return Ok(message);
                        }
                        Inbound::Event(ServerEvent::UploadError { message }) => {
                            return Err(CliError::Upload(message));
                        }
                        Inbound::Closed | Inbound::Disconnected => return Err(CliError::WsClosed),
                        _ => {}
                    }
                }
            })
            .await
            .unwrap_or(Err(CliError::Timeout))
        }
        Err(e) => Err(e),
    };

    channel.close().await;
    outcome
}

/// The account behind the current token, from an `/api/auth/me` body.
fn signed_in_user(json: &Value) -> Result<User, CliError> {
    let user = json.get("user").ok_or(CliError::MissingField("user"))?;
    Ok(serde_json::from_value(user.clone())?)
}

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// One authenticated Socket.IO session over a websocket.
struct Channel {
    stream: WsStream,
}

impl Channel {
    /// Connect, answer the engine handshake and wait for `connect`.
    async fn open(ctx: &CliContext) -> Result<Self, CliError> {
        let auth = serde_json::json!({ "token": ctx.token()? });
        let url = wire::socket_path(&ctx.socket_url);
        debug!(%url, "connecting");
        let (stream, _) = connect_async(url.as_str()).await.map_err(ws_error)?;
        let mut channel = Self { stream };

        loop {
            match channel.recv(Some(CONNECT_TIMEOUT)).await? {
                Inbound::Open(handshake) => {
                    debug!(sid = %handshake.sid, "engine open");
                    channel.send_text(wire::connect_packet(&auth)).await?;
                }
                Inbound::Connected { sid } => {
                    info!(sid = sid.as_deref().unwrap_or("-"), "chat channel connected");
                    return Ok(channel);
                }
                Inbound::ConnectError { message } => return Err(CliError::ConnectRefused(message)),
                Inbound::Closed | Inbound::Disconnected => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    }

    /// Next inbound packet other than a ping; pings are answered here.
    async fn recv(&mut self, timeout: Option<Duration>) -> Result<Inbound, CliError> {
        let stream = &mut self.stream;
        let fut = async {
            loop {
                let Some(message) = stream.next().await else {
                    return Err(CliError::WsClosed);
                };
                match message.map_err(ws_error)? {
                    Message::Text(text) => {
                        let inbound = wire::decode_inbound(text.as_str())?;
                        if let Inbound::Ping(probe) = &inbound {
                            stream
                                .send(Message::Text(wire::pong_packet(probe).into()))
                                .await
                                .map_err(ws_error)?;
                            continue;
                        }
                        return Ok(inbound);
                    }
                    Message::Close(_) => return Err(CliError::WsClosed),
                    _ => {}
                }
            }
        };

        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut).await.map_err(|_| CliError::Timeout)?,
            None => fut.await,
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), CliError> {
        self.stream.send(Message::Text(text.into())).await.map_err(ws_error)
    }

    async fn close(mut self) {
        if let Err(e) = self.send_text("41".to_owned()).await {
            warn!(error = %e, "disconnect packet not delivered");
        }
        let _ = self.stream.close(None).await;
    }
}

/// Whether `message` is the server's echo of `sent` by `self_user_id`.
fn matches_echo(message: &ChatMessage, sent: &ClientEvent, self_user_id: &str) -> bool {
    if !message.is_from(self_user_id) {
        return false;
    }
    match (&message.body, sent) {
        (MessageBody::Text(text), ClientEvent::SendMessage { message }) => text == message,
        (MessageBody::File(file), ClientEvent::UploadFile(upload)) => file.file_name == upload.file_name,
        _ => false,
    }
}

fn history_messages(json: &Value) -> Vec<ChatMessage> {
    json.get("messages")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(ChatMessage::from_wire).collect())
        .unwrap_or_default()
}

fn render_message<Tz>(message: &ChatMessage, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = message
        .timestamp
        .map_or_else(|| "--:--".to_owned(), |ts| ts.with_timezone(tz).format("%H:%M").to_string());
    match &message.body {
        MessageBody::Text(text) => format!("[{time}] {}: {text}", message.sender_name),
        MessageBody::File(file) => format!(
            "[{time}] {}: [file] {} ({}) {}",
            message.sender_name, file.file_name, file.mime_type, file.file_url
        ),
        MessageBody::System(text) => format!("[{time}] * {text}"),
    }
}

fn render_event<Tz>(event: &ServerEvent, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match event {
        ServerEvent::NewMessage(message) => render_message(message, tz),
        ServerEvent::UserJoined(user) => format!("* {} joined the chat", user.name),
        ServerEvent::UserLeft(user) => format!("* {} left the chat", user.name),
        ServerEvent::OnlineUsers(users) => {
            let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
            format!("* online ({}): {}", users.len(), names.join(", "))
        }
        ServerEvent::UploadError { message } => format!("! File upload failed: {message}"),
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

fn read_file(path: &str) -> Result<(Vec<u8>, String), CliError> {
    let bytes = std::fs::read(path)?;
    let file_name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file")
        .to_owned();
    Ok((bytes, file_name))
}

// =============================================================
// HTTP
// =============================================================

fn http_client() -> Result<reqwest::Client, CliError> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

async fn api_request(
    ctx: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let url = format!("{}{}", ctx.api_url, path);
    debug!(%method, %url, "request");

    let request = http_client()?.request(method, &url);
    let request = match ctx.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => request.bearer_auth(token),
        None => request,
    };
    let request = if let Some(json) = body { request.json(&json) } else { request };

    read_response(request.send().await?).await
}

async fn read_response(response: reqwest::Response) -> Result<Value, CliError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    interpret_response(status, &body)
}

fn interpret_response(status: u16, body: &str) -> Result<Value, CliError> {
    let value = if body.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.to_owned()))
    };
    if (200..300).contains(&status) {
        return Ok(value);
    }
    let message = response_message(&value).map_or_else(|| format!("HTTP {status}"), str::to_owned);
    if status == 401 {
        Err(CliError::Unauthorized(message))
    } else {
        Err(CliError::Server { status, message })
    }
}

fn response_message(value: &Value) -> Option<&str> {
    value
        .as_str()
        .or_else(|| value.get("message").and_then(Value::as_str))
        .or_else(|| value.get("error").and_then(Value::as_str))
        .filter(|message| !message.is_empty())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
