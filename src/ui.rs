use std::io::{self, StdoutLock, Write};
use std::time::Duration;

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::shell::{Completion, Dispatch, Shell, ShellAction};
use crate::transport::ApiClient;

const TICK: Duration = Duration::from_millis(100);

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Undoes `EnterAlternateScreen` and `EnableMouseCapture`.
fn leave_screen(out: &mut impl Write) -> io::Result<()> {
    crossterm::execute!(out, LeaveAlternateScreen, DisableMouseCapture)
}

pub struct NetassistUI<'t> {
    term: Terminal<CrosstermBackend<StdoutLock<'t>>>,
    shell: Shell,
    client: ApiClient,
    in_flight: Option<JoinHandle<()>>,
}

impl<'t> NetassistUI<'t> {
    /// Sets up the terminal. `new` undoes raw mode, the alternate screen and
    /// mouse capture if anything here fails.
    fn initialization(shell: Shell, client: ApiClient) -> Result<Self, Error> {
        let mut stdout = io::stdout().lock();
        crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let term = Terminal::new(backend)?;
        Ok(NetassistUI {
            term,
            shell,
            client,
            in_flight: None,
        })
    }

    pub fn new(shell: Shell, client: ApiClient) -> Result<Self, Error> {
        enable_raw_mode()?;
        match Self::initialization(shell, client) {
            Ok(ui) => Ok(ui),
            Err(err) => {
                disable_raw_mode()?;
                leave_screen(&mut io::stdout())?;
                Err(err)
            }
        }
    }

    pub async fn run(&mut self) -> Result<(), Error> {
        let result = self.mainloop().await;
        self.abort_in_flight();

        // restore terminal mode
        disable_raw_mode()?;
        leave_screen(self.term.backend_mut())?;
        self.term.show_cursor()?;
        result
    }

    async fn mainloop(&mut self) -> Result<(), Error> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
        let mut events = EventStream::new();
        let mut ticker = tokio::time::interval(TICK);

        loop {
            self.draw()?;
            tokio::select! {
                event = events.next() => match event {
                    Some(Ok(Event::Key(key))) => {
                        if self.handle_key(key, &tx) == Flow::Exit {
                            return Ok(());
                        }
                    }
                    Some(Ok(_)) => (),
                    Some(Err(err)) => return Err(err.into()),
                    None => return Ok(()),
                },
                Some(completion) = rx.recv() => {
                    self.shell.complete(completion);
                }
                _ = ticker.tick() => self.shell.spin(),
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, tx: &UnboundedSender<Completion>) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        if let KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } = key
        {
            return Flow::Exit;
        }
        match self.shell.handle_key(key) {
            ShellAction::Submit(dispatch) => self.spawn_request(dispatch, tx),
            ShellAction::Cancelled | ShellAction::Switched => self.abort_in_flight(),
            ShellAction::None => (),
        }
        Flow::Continue
    }

    /// Only the newest request is worth finishing, so a resubmission aborts
    /// whatever was still running.
    fn spawn_request(&mut self, dispatch: Dispatch, tx: &UnboundedSender<Completion>) {
        self.abort_in_flight();
        let client = self.client.clone();
        let tx = tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let completion = dispatch.send(&client).await;
            // the receiver only disappears when the UI is shutting down
            let _ = tx.send(completion);
        }));
    }

    fn abort_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }

    fn draw(&mut self) -> Result<(), Error> {
        self.term.draw(|f| self.shell.render(f))?;
        Ok(())
    }
}
