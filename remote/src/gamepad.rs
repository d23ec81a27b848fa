use gilrs::{Button, Event, EventType, Gilrs};
use std::{thread, time};
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};

use crate::input::{scale_trigger, Input, InputState, Trigger};
use crate::Error;

const POLL_INTERVAL: time::Duration = time::Duration::from_millis(1);

/// Maps a button change onto the controls the remote uses.
pub fn translate(button: Button, value: f32) -> Option<Input> {
    match button {
        Button::RightTrigger2 => Some(Input::Trigger(Trigger::R2, scale_trigger(value))),
        Button::LeftTrigger2 => Some(Input::Trigger(Trigger::L2, scale_trigger(value))),
        Button::DPadLeft => Some(Input::DpadLeft(value > 0.5)),
        Button::DPadRight => Some(Input::DpadRight(value > 0.5)),
        _ => None,
    }
}

/// Opens the first gamepad and polls it on its own thread. The returned
/// receiver closes when the gamepad disconnects.
pub async fn open() -> Result<watch::Receiver<InputState>, Error> {
    let (tx, rx) = watch::channel(InputState::default());
    let (opened_tx, opened_rx) = oneshot::channel();

    thread::spawn(move || {
        // gilrs is not Send, it has to live on this thread
        let mut gilrs = match init() {
            Ok(gilrs) => {
                let _ = opened_tx.send(Ok(()));
                gilrs
            }
            Err(e) => {
                let _ = opened_tx.send(Err(e));
                return;
            }
        };
        run(&mut gilrs, &tx);
        info!("gamepad closed");
    });

    opened_rx
        .await
        .map_err(|_| Error::Input("gamepad thread died".into()))??;
    Ok(rx)
}

fn init() -> Result<Gilrs, Error> {
    let gilrs = Gilrs::new().map_err(|e| Error::Input(e.to_string()))?;

    let mut found = false;
    for (_id, gamepad) in gilrs.gamepads() {
        info!("- {}", gamepad.name());
        found = true;
    }
    match found {
        true => Ok(gilrs),
        false => Err(Error::Input("no gamepad found".into())),
    }
}

fn run(gilrs: &mut Gilrs, tx: &watch::Sender<InputState>) {
    let mut state = InputState::default();
    while !tx.is_closed() {
        while let Some(Event { event, .. }) = gilrs.next_event() {
            match event {
                EventType::ButtonChanged(button, value, _) => {
                    if let Some(input) = translate(button, value) {
                        state.apply(input);
                    }
                }
                EventType::Disconnected => {
                    warn!("gamepad disconnected");
                    return;
                }
                _ => {}
            }
        }
        tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });

        thread::sleep(POLL_INTERVAL);
    }
}
