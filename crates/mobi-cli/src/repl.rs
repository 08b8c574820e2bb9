// Line-oriented front end.
//
// Reads commands from an async line source and prints UI updates from the
// app loop. On `quit` or end of input it sends `Quit`, then keeps printing
// until the app loop closes the update channel.

use std::io::Write;
use std::path::{Path, PathBuf};

use mobi_app::design::ResultState;
use mobi_app::protocol::{UiUpdate, UserCommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::commands::{self, Input};
use crate::output;
use crate::render;

pub const BANNER: &str = "Mobi CRM. Escribe 'help' para ver los comandos.";

/// Prints updates, keeping track of an in-progress coach stream.
pub struct Printer<W: Write> {
    out: W,
    output_dir: PathBuf,
    /// Coach tokens have been printed without a trailing newline.
    streaming: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            out,
            output_dir: output_dir.into(),
            streaming: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn line(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    pub fn print(&mut self, update: &UiUpdate) -> std::io::Result<()> {
        match update {
            UiUpdate::CoachToken(text) => {
                if !self.streaming {
                    write!(self.out, "Mobi: ")?;
                    self.streaming = true;
                }
                write!(self.out, "{text}")?;
                return self.out.flush();
            }
            // The tokens already showed the answer.
            UiUpdate::CoachComplete(_) if self.streaming => {
                self.streaming = false;
                return self.line("");
            }
            UiUpdate::CoachError(_) if self.streaming => {
                self.streaming = false;
                writeln!(self.out)?;
            }
            _ => {}
        }

        self.line(&render::render(update))?;

        let saved = match update {
            UiUpdate::DesignProgress(ResultState::Success(image)) => {
                Some(output::save_image(&self.output_dir, "design", image))
            }
            UiUpdate::DreamImage(image) => output::parse_data_url(&image.data_url)
                .map(|image| output::save_image(&self.output_dir, "dream", &image)),
            _ => None,
        };
        match saved {
            Some(Ok(path)) => self.line(&format!("Imagen guardada en {}", path.display())),
            Some(Err(e)) => {
                warn!(error = %e, "could not save generated image");
                self.line(&format!("No se pudo guardar la imagen: {e}"))
            }
            None => Ok(()),
        }
    }
}

/// Run the front end until the user quits or the input ends.
pub async fn run<R, W>(
    input: R,
    printer: &mut Printer<W>,
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    printer.line(BANNER)?;

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(update) => printer.print(&update)?,
                    None => {
                        info!("UI channel closed");
                        return Ok(());
                    }
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input ended, shutting down");
                    break;
                };
                match commands::parse_command(&line) {
                    Ok(Input::Empty) => {}
                    Ok(Input::Help) => printer.line(commands::HELP)?,
                    Ok(Input::Command(UserCommand::Quit)) => break,
                    Ok(Input::Command(cmd)) => {
                        if cmd_tx.send(cmd).await.is_err() {
                            warn!("Command channel closed");
                            return Ok(());
                        }
                    }
                    Err(e) => printer.line(&format!("Error: {e}"))?,
                }
            }
        }
    }

    // Commands already queued are answered before the app loop exits.
    let _ = cmd_tx.send(UserCommand::Quit).await;
    drop(cmd_tx);
    while let Some(update) = ui_rx.recv().await {
        printer.print(&update)?;
    }
    Ok(())
}

/// Directory generated images go to when none is given.
pub fn default_output_dir() -> &'static Path {
    Path::new(output::OUTPUT_DIR)
}
