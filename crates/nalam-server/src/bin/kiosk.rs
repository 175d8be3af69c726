//! Nalam kiosk binary: a local run loop writing to stdout.
//!
//! Uses the same configuration file as the server. With
//! `kiosk.speak_replies = true` every reply is also spoken through the
//! configured TTS voice and audio player. With `kiosk.listen = true` input
//! is recorded from the microphone and transcribed instead of read from
//! stdin.

use nalam_server::kiosk::{self, Input, KioskSettings, Microphone, Speaker};
use nalam_server::{config, startup};
use tokio::io::{BufReader, Stdin};

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = config::resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the kiosk cannot start without valid config");

    startup::init_tracing(&config.logging);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let pool = startup::open_database(&config.database).expect("failed to open database");
    let dialogue =
        startup::build_dialogue(&config, pool).expect("failed to build dialogue pipeline");

    let speaker = if config.kiosk.speak_replies {
        let tts = config
            .voice
            .tts_service()
            .await
            .expect("invalid voice configuration");
        Some(Speaker {
            tts,
            player: config.voice.player(),
        })
    } else {
        None
    };

    let input: Input<BufReader<Stdin>> = if config.kiosk.listen {
        Input::Spoken(Microphone {
            recorder: config.voice.recorder(),
            stt: config.voice.stt_service(),
        })
    } else {
        Input::typed(BufReader::new(tokio::io::stdin()))
    };

    let mut stdout = tokio::io::stdout();
    let session = kiosk::run(
        &dialogue,
        KioskSettings::from(&config.kiosk),
        speaker.as_ref(),
        input,
        &mut stdout,
    )
    .await
    .expect("kiosk loop failed");

    tracing::info!(language = %session.language, "kiosk stopped");
}
