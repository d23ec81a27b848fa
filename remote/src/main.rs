use remote::ble::{Hub, COMMAND_EVENT_CHAR, HUB_NAME};
use remote::controller::Controller;
use remote::gate::ReadyGate;
use remote::input::InputState;
use remote::link::TIME_BETWEEN_ACTIONS;
use remote::{keyboard, Error};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Clone, Copy, Debug)]
enum InputKind {
    Gamepad,
    Keyboard,
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gamepad" => Ok(InputKind::Gamepad),
            "keyboard" => Ok(InputKind::Keyboard),
            _ => Err(format!("unknown input {s}, use gamepad or keyboard")),
        }
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = "remote")]
struct Opts {
    /// Advertised name of the hub
    #[structopt(long, default_value = HUB_NAME)]
    hub_name: String,

    /// Command characteristic [default: c5f50002-8280-46da-89f4-6d8051e4aeef]
    #[structopt(long, parse(try_from_str = Uuid::parse_str))]
    characteristic: Option<Uuid>,

    /// gamepad or keyboard
    #[structopt(short, long, default_value = "gamepad")]
    input: InputKind,

    /// Pause after every command [default: 100]
    #[structopt(long)]
    pause_ms: Option<u64>,

    /// Sleep between input samples when nothing was sent
    #[structopt(long, default_value = "10")]
    tick_ms: u64,

    /// Give up when the hub does not get ready in time. Waits forever if unset.
    #[structopt(long)]
    ready_timeout_ms: Option<u64>,

    #[structopt(long, default_value = "10")]
    scan_timeout_s: u64,
}

async fn open_input(kind: InputKind) -> Result<watch::Receiver<InputState>, Error> {
    match kind {
        #[cfg(feature = "gamepad")]
        InputKind::Gamepad => remote::gamepad::open().await,
        #[cfg(not(feature = "gamepad"))]
        InputKind::Gamepad => Err(Error::Input(
            "built without gamepad support, use --input keyboard".into(),
        )),
        InputKind::Keyboard => keyboard::spawn(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // keyboard input puts the terminal into raw mode
    tracing_subscriber::fmt()
        .with_writer(keyboard::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::from_args();
    debug!("{:#?}", opts);

    let hub = Hub::connect(
        &opts.hub_name,
        opts.characteristic.unwrap_or(COMMAND_EVENT_CHAR),
        Duration::from_secs(opts.scan_timeout_s),
    )
    .await?;
    let input = open_input(opts.input).await?;

    let gate = Arc::new(ReadyGate::new());
    let link = hub
        .link(gate.clone())
        .with_pause(
            opts.pause_ms
                .map(Duration::from_millis)
                .unwrap_or(TIME_BETWEEN_ACTIONS),
        )
        .with_ready_timeout(opts.ready_timeout_ms.map(Duration::from_millis));
    let mut controller =
        Controller::new(input, link).with_idle(Duration::from_millis(opts.tick_ms));

    info!("Start the program on the hub now with the button.");

    let result = tokio::select! {
        result = controller.run() => result,
        result = hub.listen(&gate) => result,
        result = hub.disconnected() => {
            info!("Hub disconnected.");
            result
        }
    };

    hub.disconnect().await?;
    info!("done.");
    result
}
