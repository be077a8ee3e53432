use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shot_leadup::charts::{
    CommonEventMap, OutcomeSummary, outcome_summaries, render_common_event_map,
    render_involvement_bars, render_minutes_scatter, render_outcome_box_plot,
};
use shot_leadup::config::AnalysisConfig;
use shot_leadup::export::export_workbook;
use shot_leadup::involvement::{
    InvolvementPoint, PlayerInvolvement, minutes_vs_involvement, player_involvement,
};
use shot_leadup::pipeline::{self, AnalysisReport};
use shot_leadup::provider::minutes_played;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Outcomes,
    Involvement,
    Minutes,
    CommonEvent,
}

impl Screen {
    fn next(self) -> Self {
        match self {
            Screen::Outcomes => Screen::Involvement,
            Screen::Involvement => Screen::Minutes,
            Screen::Minutes => Screen::CommonEvent,
            Screen::CommonEvent => Screen::Outcomes,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Screen::Outcomes => "xG by outcome",
            Screen::Involvement => "Involvement",
            Screen::Minutes => "Minutes vs involvement",
            Screen::CommonEvent => "Common event map",
        }
    }
}

struct App {
    screen: Screen,
    should_quit: bool,
    help_overlay: bool,
    report: AnalysisReport,
    outcomes: Vec<OutcomeSummary>,
    involvement: Vec<PlayerInvolvement>,
    minutes: Vec<InvolvementPoint>,
    common_map: Option<CommonEventMap>,
}

impl App {
    fn new(report: AnalysisReport, minutes: Vec<InvolvementPoint>) -> Self {
        let outcomes = outcome_summaries(&report.events);
        let involvement = player_involvement(&report.leading);
        let common_map = CommonEventMap::prepare(&report.leading, &report.common_event);
        Self {
            screen: Screen::Outcomes,
            should_quit: false,
            help_overlay: false,
            report,
            outcomes,
            involvement,
            minutes,
            common_map,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.screen = Screen::Outcomes,
            KeyCode::Char('2') => self.screen = Screen::Involvement,
            KeyCode::Char('3') => self.screen = Screen::Minutes,
            KeyCode::Char('4') => self.screen = Screen::CommonEvent,
            KeyCode::Tab => self.screen = self.screen.next(),
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            KeyCode::Esc => self.help_overlay = false,
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cfg = AnalysisConfig::from_env();
    let report = pipeline::run(&cfg)?;

    let minutes = match cfg.season {
        Some(season) => {
            let rows = minutes_played(season.competition_id, season.season_id, &cfg.team, cfg.fetch_mode)?;
            minutes_vs_involvement(&report.events, &report.leading, &rows)
        }
        None => {
            warn!("competition/season not set; minutes chart will be empty");
            Vec::new()
        }
    };

    if let Some(path) = &cfg.export_path {
        let exported = export_workbook(path, &report, &minutes)?;
        info!(
            rows = exported.leading_rows,
            patterns = exported.patterns,
            players = exported.players,
            "export finished"
        );
    }

    let mut app = App::new(report, minutes);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let poll_interval = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(poll_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.screen {
        Screen::Outcomes => render_outcome_box_plot(frame, chunks[1], &app.outcomes),
        Screen::Involvement => render_involvement_bars(frame, chunks[1], &app.involvement),
        Screen::Minutes => render_minutes_scatter(frame, chunks[1], &app.minutes),
        Screen::CommonEvent => render_common_event_map(frame, chunks[1], app.common_map.as_ref()),
    }

    let footer = Paragraph::new("1 Outcomes | 2 Involvement | 3 Minutes | 4 Common event | Tab Next | ? Help | q Quit")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let report = &app.report;
    let line1 = format!(
        "SHOT LEAD-UP | {} | {}",
        report.team,
        app.screen.label()
    );
    let line2 = format!(
        "{} matches | {} events | {} shots | common event #{}: {}",
        report.matches(),
        report.events.len(),
        report.shots(),
        report.pattern_rank,
        report.common_event
    );
    format!("{line1}\n{line2}")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Shot lead-up - Help",
        "",
        "  1            xG by shot outcome",
        "  2            Leading-event involvement",
        "  3            Minutes vs involvement",
        "  4            Common event pitch map",
        "  Tab          Next screen",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::{App, Screen, ui};
    use shot_leadup::config::AnalysisConfig;
    use shot_leadup::events::RawEvent;
    use shot_leadup::pipeline::analyze;

    fn raw(index: u64, event_type: &str, xg: Option<f64>) -> RawEvent {
        RawEvent {
            match_id: 1,
            index,
            event_type: event_type.to_string(),
            team: "Arsenal".to_string(),
            player: Some("Bukayo Saka".to_string()),
            player_id: Some("1.0".to_string()),
            position: Some("Right Wing".to_string()),
            shot_statsbomb_xg: xg,
            shot_outcome: xg.map(|_| "Goal".to_string()),
            location: Some("[90.0, 30.0]".to_string()),
            pass_end_location: Some("[100.0, 40.0]".to_string()),
            carry_end_location: None,
            pass_recipient: None,
        }
    }

    fn app() -> App {
        let rows = vec![raw(1, "Pass", None), raw(2, "Shot", Some(0.3))];
        let report = analyze(&rows, &AnalysisConfig::default()).expect("pipeline should run");
        App::new(report, Vec::new())
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn number_keys_and_tab_switch_screens() {
        let mut app = app();
        assert_eq!(app.screen, Screen::Outcomes);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.screen, Screen::Minutes);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.screen, Screen::CommonEvent);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.screen, Screen::Outcomes);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn draws_the_selected_screen() {
        let mut app = app();
        assert!(screen_text(&app).contains("xG by shot outcome"));
        press(&mut app, KeyCode::Char('2'));
        assert!(screen_text(&app).contains("Leading-event involvements per player"));
        press(&mut app, KeyCode::Char('?'));
        assert!(screen_text(&app).contains("Toggle help"));
        press(&mut app, KeyCode::Esc);
        assert!(!screen_text(&app).contains("Toggle help"));
    }
}
