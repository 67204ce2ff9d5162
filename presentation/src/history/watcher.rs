//! Follows a mounted history view and redraws it on every snapshot.

use crate::output::console::ConsoleFormatter;
use pestwatch_application::{HistoryStore, HistoryView};
use std::future::Future;
use std::io::Write;

/// Terminal renderer for a live [`HistoryView`]
pub struct HistoryWatcher<H: HistoryStore + 'static> {
    view: HistoryView<H>,
    clear_screen: bool,
}

impl<H: HistoryStore + 'static> HistoryWatcher<H> {
    pub fn new(view: HistoryView<H>) -> Self {
        Self {
            view,
            clear_screen: true,
        }
    }

    /// Redraw in place instead of appending frames
    pub fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    /// Render until Ctrl-C.
    pub async fn run(self) -> std::io::Result<()> {
        let mut stdout = std::io::stdout();
        self.run_until(
            async {
                let _ = tokio::signal::ctrl_c().await;
            },
            &mut stdout,
        )
        .await
    }

    /// Render until `shutdown` completes or the view stops changing, then
    /// unmount.
    pub async fn run_until<F, W>(mut self, shutdown: F, out: &mut W) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
        W: Write,
    {
        tokio::pin!(shutdown);
        self.render(out)?;

        loop {
            tokio::select! {
                changed = self.view.changed() => {
                    if !changed {
                        break;
                    }
                    self.render(out)?;
                }
                _ = &mut shutdown => break,
            }
        }

        self.view.unmount();
        Ok(())
    }

    fn render<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.clear_screen {
            write!(out, "\x1b[2J\x1b[H")?;
        }
        write!(out, "{}", ConsoleFormatter::format_history_view(&self.view.view()))?;
        out.flush()
    }
}
