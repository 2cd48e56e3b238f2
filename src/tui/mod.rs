mod app_logic;
mod app_state;
mod event_handler;
mod ui_renderer;

pub use app_state::{PromptForm, StartupSelection};

pub use self::run_tui::run_tui;

// Main TUI loop and terminal setup/teardown
mod run_tui {
    use super::app_logic::TuiApp;
    use super::app_state::{PromptForm, StartupSelection};
    use super::event_handler::handle_events;
    use super::ui_renderer::ui_frame;
    use crate::backend::Backend;
    use crate::session::Session;
    use anyhow::Result;
    use crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::prelude::{CrosstermBackend, Terminal};
    use std::io::{self, Stdout};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::runtime::Handle;
    use tracing::info;

    /// Run the interactive picker until the user quits. Returns the session
    /// so the caller can inspect what was left selected.
    pub fn run_tui(
        session: Session,
        backend: Arc<dyn Backend>,
        runtime: Handle,
        form: PromptForm,
        startup: StartupSelection,
        export_dir: PathBuf,
    ) -> Result<Session> {
        let mut app = TuiApp::new(session, backend, runtime, form, startup, export_dir);
        app.start();

        let mut terminal = init_terminal()?;
        let result = event_loop(&mut terminal, &mut app);
        restore_terminal(terminal)?;
        result?;

        info!(
            selected = app.session.selection.summary().count(),
            "interactive session closed"
        );
        Ok(app.session)
    }

    fn event_loop(
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        app: &mut TuiApp,
    ) -> Result<()> {
        while !app.quit {
            app.drain_completions();
            terminal.draw(|frame| ui_frame(frame, app))?;
            handle_events(app)?;
        }
        Ok(())
    }

    fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).map_err(Into::into)
    }

    fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor().map_err(Into::into)
    }
}
