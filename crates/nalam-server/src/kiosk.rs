//! Local kiosk run loop.
//!
//! Takes one utterance at a time, either typed (one per line) or spoken
//! (recorded and transcribed in the session language), runs a dialogue turn
//! for it and writes the reply, optionally speaking it. Silence is handled
//! in two steps: after `idle_warning` the user is asked whether they are
//! still there, and after a further `idle_reset` the conversation starts
//! over in the default language. The sticky model credential survives a
//! reset.

use crate::config::KioskConfig;
use nalam_dialogue::Dialogue;
use nalam_types::{Language, SessionState};
use nalam_voice::{AudioPlayer, AudioRecorder, SttService, Transcript, TtsService};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::time::Instant;

/// Pause after a failed capture before listening again.
const UNAVAILABLE_PAUSE: Duration = Duration::from_secs(1);

/// Fixed phrases spoken by the loop itself.
#[derive(Debug, Clone, Copy)]
pub struct Phrases {
    pub greeting: &'static str,
    pub idle_warning: &'static str,
    pub apology: &'static str,
    pub unavailable: &'static str,
    pub farewell: &'static str,
}

pub fn phrases(language: Language) -> Phrases {
    match language {
        Language::En => Phrases {
            greeting: "Welcome to Nalam Kiosk. How can I help you today?",
            idle_warning: "Are you still there? I will start over soon if I don't hear from you.",
            apology: "Sorry, I encountered an error. Please try again.",
            unavailable: "Sorry, the speech service is unavailable right now.",
            farewell: "Thank you for using Nalam Kiosk. Goodbye!",
        },
        Language::Hi => Phrases {
            greeting: "नलम कियोस्क में आपका स्वागत है। आज मैं आपकी क्या मदद कर सकता हूँ?",
            idle_warning: "क्या आप अभी भी वहाँ हैं? जवाब न मिलने पर मैं जल्द ही नई शुरुआत करूँगा।",
            apology: "क्षमा करें, कोई त्रुटि हुई। कृपया फिर से प्रयास करें।",
            unavailable: "क्षमा करें, वाक् सेवा अभी उपलब्ध नहीं है।",
            farewell: "नलम कियोस्क का उपयोग करने के लिए धन्यवाद। नमस्ते!",
        },
        Language::Ta => Phrases {
            greeting: "நலம் கியோஸ்க்கிற்கு வரவேற்கிறோம். இன்று நான் உங்களுக்கு எப்படி உதவ முடியும்?",
            idle_warning: "நீங்கள் இன்னும் இருக்கிறீர்களா? பதில் இல்லையென்றால் விரைவில் மீண்டும் தொடங்குவேன்.",
            apology: "மன்னிக்கவும், ஒரு பிழை ஏற்பட்டது. மீண்டும் முயற்சிக்கவும்.",
            unavailable: "மன்னிக்கவும், பேச்சு சேவை இப்போது கிடைக்கவில்லை.",
            farewell: "நலம் கியோஸ்க்கைப் பயன்படுத்தியதற்கு நன்றி. வணக்கம்!",
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KioskSettings {
    pub idle_warning: Duration,
    pub idle_reset: Duration,
}

impl From<&KioskConfig> for KioskSettings {
    fn from(config: &KioskConfig) -> Self {
        Self {
            idle_warning: Duration::from_secs(config.idle_warning_secs),
            idle_reset: Duration::from_secs(config.idle_reset_secs),
        }
    }
}

/// Speaks text through TTS and an audio player. Failures are logged only.
#[derive(Debug, Clone)]
pub struct Speaker {
    pub tts: TtsService,
    pub player: AudioPlayer,
}

impl Speaker {
    pub async fn speak(&self, text: &str, language: Language) {
        let audio = match self.tts.synthesize(text, language).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(error = %e, "could not synthesize reply");
                return;
            }
        };
        if let Err(e) = self.player.play(&audio.bytes).await {
            tracing::warn!(error = %e, "could not play reply");
        }
    }
}

/// Microphone capture plus recognition.
#[derive(Debug, Clone)]
pub struct Microphone {
    pub recorder: AudioRecorder,
    pub stt: SttService,
}

/// Where utterances come from.
pub enum Input<R> {
    Typed(Lines<R>),
    Spoken(Microphone),
}

impl<R: AsyncBufRead + Unpin> Input<R> {
    pub fn typed(reader: R) -> Self {
        Input::Typed(reader.lines())
    }

    /// Waits for the next utterance, giving up after `wait` if set.
    async fn next(&mut self, language: Language, wait: Option<Duration>) -> std::io::Result<Heard> {
        match self {
            Input::Typed(lines) => {
                let next = match wait {
                    Some(wait) => match tokio::time::timeout(wait, lines.next_line()).await {
                        Ok(next) => next?,
                        Err(_elapsed) => return Ok(Heard::Silence),
                    },
                    None => lines.next_line().await?,
                };
                Ok(next.map_or(Heard::Ended, Heard::Said))
            }
            Input::Spoken(mic) => Ok(mic.listen(language, wait).await),
        }
    }
}

impl Microphone {
    /// Records until something is understood. No speech means listen again
    /// until `wait` has passed.
    async fn listen(&self, language: Language, wait: Option<Duration>) -> Heard {
        let started = Instant::now();
        loop {
            let audio = match self.recorder.record().await {
                Ok(audio) => audio,
                Err(e) => {
                    tracing::warn!(error = %e, "audio capture failed");
                    return Heard::Unavailable;
                }
            };
            match self.stt.transcribe(&audio, language).await {
                Ok(Transcript::Text(text)) => return Heard::Said(text),
                Ok(Transcript::NoSpeech) => {
                    tracing::debug!("no speech detected, listening again");
                    if wait.is_some_and(|wait| started.elapsed() >= wait) {
                        return Heard::Silence;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "speech recognition failed");
                    return Heard::Unavailable;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Heard {
    Said(String),
    /// Nothing was said before the deadline.
    Silence,
    /// Capture or recognition failed.
    Unavailable,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Idle {
    Listening,
    Warned,
    /// Session was reset; wait without a deadline for the next user.
    Reset,
}

struct Console<'a, W> {
    out: &'a mut W,
    speaker: Option<&'a Speaker>,
}

impl<W: AsyncWrite + Unpin> Console<'_, W> {
    async fn say(&mut self, text: &str, language: Language) -> std::io::Result<()> {
        self.out
            .write_all(format!("Nalam [{}]: {}\n", language, text).as_bytes())
            .await?;
        self.out.flush().await?;
        if let Some(speaker) = self.speaker {
            speaker.speak(text, language).await;
        }
        Ok(())
    }
}

fn is_exit(line: &str) -> bool {
    matches!(line.to_ascii_lowercase().as_str(), "exit" | "quit")
}

/// Runs the loop until `exit`/`quit` or end of input and returns the final
/// session state.
pub async fn run<R, W>(
    dialogue: &Dialogue,
    settings: KioskSettings,
    speaker: Option<&Speaker>,
    mut input: Input<R>,
    output: &mut W,
) -> std::io::Result<SessionState>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut console = Console {
        out: output,
        speaker,
    };
    let mut session = SessionState::default();
    let mut idle = Idle::Listening;

    console.say(phrases(session.language).greeting, session.language).await?;

    loop {
        let wait = match idle {
            Idle::Listening => Some(settings.idle_warning),
            Idle::Warned => Some(settings.idle_reset),
            Idle::Reset => None,
        };

        let line = match input.next(session.language, wait).await? {
            Heard::Silence if idle == Idle::Listening => {
                tracing::debug!("user idle, warning");
                console.say(phrases(session.language).idle_warning, session.language).await?;
                idle = Idle::Warned;
                continue;
            }
            Heard::Silence => {
                tracing::info!("user idle, resetting session");
                session = SessionState {
                    language: Language::default(),
                    credential: session.credential,
                };
                console.say(phrases(session.language).greeting, session.language).await?;
                idle = Idle::Reset;
                continue;
            }
            Heard::Unavailable => {
                console.say(phrases(session.language).unavailable, session.language).await?;
                tokio::time::sleep(UNAVAILABLE_PAUSE).await;
                continue;
            }
            Heard::Ended => break,
            Heard::Said(line) => line,
        };

        idle = Idle::Listening;
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }
        if is_exit(utterance) {
            break;
        }

        match dialogue.run_turn(&mut session, utterance).await {
            Ok(outcome) => {
                console
                    .say(&outcome.reply.response_text, outcome.reply.language_code)
                    .await?;
            }
            Err(e) => {
                tracing::error!(error = %e, "kiosk turn failed");
                console.say(phrases(session.language).apology, session.language).await?;
            }
        }
    }

    console.say(phrases(session.language).farewell, session.language).await?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_distinct_phrases() {
        for language in Language::ALL {
            let p = phrases(language);
            assert!(!p.greeting.is_empty());
            assert_ne!(p.greeting, p.idle_warning);
            assert_ne!(p.apology, p.unavailable);
        }
        assert_ne!(phrases(Language::Hi).greeting, phrases(Language::Ta).greeting);
    }

    #[test]
    fn exit_words_are_case_insensitive() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(!is_exit("exit please"));
    }
}
