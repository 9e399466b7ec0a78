use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use todo_api::{
    application::todo_service::{TodoService, TodoServiceImpl},
    config::Config,
    domain::{repository::TodoRepository, todo::{DueDateInput, Todo, TodoDraft, UpdateTodo, DUE_DATE_FORMAT}},
    infrastructure::sqlite_repo::SqliteTodoRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;
    let repo = SqliteTodoRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let service = TodoServiceImpl::new(repo.clone());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, service, &config.database_url).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    repo.close().await;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit }

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Filter { All, Pending, Completed }

impl Filter {
    fn next(self) -> Self { match self { Filter::All => Filter::Pending, Filter::Pending => Filter::Completed, Filter::Completed => Filter::All } }
    fn label(self) -> &'static str { match self { Filter::All => "All", Filter::Pending => "Pending", Filter::Completed => "Completed" } }
    fn includes(self, todo: &Todo) -> bool {
        match self { Filter::All => true, Filter::Pending => !todo.completed, Filter::Completed => todo.completed }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field { Title, DueDate, Priority, Category }

impl Field {
    fn next(self) -> Self { match self { Field::Title => Field::DueDate, Field::DueDate => Field::Priority, Field::Priority => Field::Category, Field::Category => Field::Title } }
    fn label(self) -> &'static str { match self { Field::Title => "Title", Field::DueDate => "Due (YYYY-MM-DD)", Field::Priority => "Priority", Field::Category => "Category" } }
}

/// Counters shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Stats { total: usize, completed: usize, pending: usize, rate: u32 }

impl Stats {
    fn from_todos(todos: &[Todo]) -> Self {
        let total = todos.len();
        let completed = todos.iter().filter(|t| t.completed).count();
        let rate = if total == 0 { 0 } else { ((completed as f64 / total as f64) * 100.0).round() as u32 };
        Stats { total, completed, pending: total - completed, rate }
    }
}

#[derive(Default)]
struct Draft { title: String, due_date: String, priority: String, category: String }

impl Draft {
    fn from_todo(t: &Todo) -> Self {
        Draft {
            title: t.title.clone(),
            due_date: t.due_date.map(|d| d.format(DUE_DATE_FORMAT).to_string()).unwrap_or_default(),
            priority: t.priority.clone(),
            category: t.category.clone(),
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field { Field::Title => &mut self.title, Field::DueDate => &mut self.due_date, Field::Priority => &mut self.priority, Field::Category => &mut self.category }
    }

    fn field(&self, field: Field) -> &str {
        match field { Field::Title => &self.title, Field::DueDate => &self.due_date, Field::Priority => &self.priority, Field::Category => &self.category }
    }

    fn into_create(self) -> TodoDraft {
        TodoDraft {
            title: Some(self.title.trim().to_string()),
            due_date: DueDateInput::from_text(self.due_date.trim()),
            priority: non_empty(self.priority),
            category: non_empty(self.category),
        }
    }

    fn into_update(self) -> UpdateTodo {
        UpdateTodo {
            title: non_empty(self.title),
            completed: None,
            due_date: DueDateInput::from_text(self.due_date.trim()).on_update(),
            priority: non_empty(self.priority),
            category: non_empty(self.category),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

struct App<R: TodoRepository> {
    service: TodoServiceImpl<R>,
    items: Vec<Todo>,
    selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    filter: Filter,
    filtered_indices: Vec<usize>,
    field: Field,
    draft: Draft,
    status: String,
}

impl<R: TodoRepository> App<R> {
    async fn load(&mut self) -> Result<()> {
        self.items = self.service.list().await?;
        self.recompute_filtered();
        Ok(())
    }

    fn recompute_filtered(&mut self) {
        self.filtered_indices = self.items.iter().enumerate().filter(|(_, t)| self.filter.includes(t)).map(|(i, _)| i).collect();
        let len = self.filtered_indices.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }

    fn current(&self) -> Option<&Todo> {
        self.filtered_indices.get(self.selected).and_then(|&idx| self.items.get(idx))
    }

    fn report<T>(&mut self, outcome: todo_api::application::todo_service::Result<T>, ok: &str) {
        self.status = match outcome { Ok(_) => ok.to_string(), Err(e) => format!("error: {e}") };
    }
}

async fn run_app<R: TodoRepository>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, service: TodoServiceImpl<R>, database_url: &str) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { service, items: vec![], selected: 0, last_tick: Instant::now(), mode: Mode::View, list_state: ListState::default(), filter: Filter::All, filtered_indices: Vec::new(), field: Field::Title, draft: Draft::default(), status: String::new() };
    app.load().await?;

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
                .split(f.size());

            let header = Paragraph::new("Enter/space: toggle, n: new, e: edit, d: delete, f: filter, q: quit  |  Form: Tab next field, Enter save, Esc cancel")
                .block(Block::default().borders(Borders::ALL).title("todo-tui"));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let list_items: Vec<ListItem> = app.filtered_indices.iter().filter_map(|&idx| app.items.get(idx)).map(|t| {
                let mark = if t.completed { "[x]" } else { "[ ]" };
                let due = t.due_date.map(|d| format!("  due {}", d.format(DUE_DATE_FORMAT))).unwrap_or_default();
                ListItem::new(format!("{} {} ({}){}", mark, t.title, t.priority, due))
            }).collect();
            if app.filtered_indices.is_empty() { app.list_state.select(None); } else { app.list_state.select(Some(app.selected)); }
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("todos [{}]", app.filter.label())))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail = match app.current() {
                Some(t) => format!(
                    "#{}  {}\n\nStatus: {}\nDue: {}\nPriority: {}\nCategory: {}\nCreated: {}",
                    t.id, t.title,
                    if t.completed { "Completed" } else { "Pending" },
                    t.due_date.map(|d| d.format(DUE_DATE_FORMAT).to_string()).unwrap_or_else(|| "(none)".to_string()),
                    t.priority, t.category,
                    t.created_at.format("%Y-%m-%d %H:%M"),
                ),
                None => String::new(),
            };
            let details = Paragraph::new(detail).block(Block::default().borders(Borders::ALL).title("details"));
            f.render_widget(details, middle[1]);

            let footer_text = match app.mode {
                Mode::View => {
                    let s = Stats::from_todos(&app.items);
                    format!("{} total, {} done, {} pending, {}% complete  |  {}  |  {}", s.total, s.completed, s.pending, s.rate, database_url, app.status)
                }
                Mode::Create | Mode::Edit => format!("{}: {}_", app.field.label(), app.draft.field(app.field)),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create", Mode::Edit => "edit" }));
            f.render_widget(footer, chunks[2]);
        })?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Repeats and releases would double every keystroke on some terminals.
                if key.kind != KeyEventKind::Press { continue; }
                match app.mode {
                    Mode::View => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Up => { if app.selected > 0 { app.selected -= 1; } }
                        KeyCode::Down => { if app.selected + 1 < app.filtered_indices.len() { app.selected += 1; } }
                        KeyCode::Enter | KeyCode::Char(' ') => {
                            if let Some(id) = app.current().map(|t| t.id) {
                                let outcome = app.service.toggle(id).await;
                                let msg = match &outcome { Ok(t) if t.completed => "completed", _ => "uncompleted" };
                                app.report(outcome, msg);
                                app.load().await?;
                            }
                        }
                        KeyCode::Char('n') => {
                            app.mode = Mode::Create;
                            app.field = Field::Title;
                            app.draft = Draft::default();
                        }
                        KeyCode::Char('e') => {
                            if let Some(draft) = app.current().map(Draft::from_todo) {
                                app.mode = Mode::Edit;
                                app.field = Field::Title;
                                app.draft = draft;
                            }
                        }
                        KeyCode::Char('d') => {
                            if let Some(id) = app.current().map(|t| t.id) {
                                let outcome = app.service.delete(id).await;
                                app.report(outcome, "deleted");
                                if app.selected > 0 { app.selected -= 1; }
                                app.load().await?;
                            }
                        }
                        KeyCode::Char('f') => {
                            app.filter = app.filter.next();
                            app.recompute_filtered();
                        }
                        _ => {}
                    },
                    Mode::Create | Mode::Edit => match key.code {
                        KeyCode::Esc => { app.mode = Mode::View; app.draft = Draft::default(); }
                        KeyCode::Enter => {
                            let draft = std::mem::take(&mut app.draft);
                            if app.mode == Mode::Create {
                                // The API accepts empty titles; the form does not.
                                if !draft.title.trim().is_empty() {
                                    let outcome = app.service.create(draft.into_create()).await;
                                    app.report(outcome, "created");
                                }
                            } else if let Some(id) = app.current().map(|t| t.id) {
                                let outcome = app.service.update(id, draft.into_update()).await;
                                app.report(outcome, "updated");
                            }
                            app.mode = Mode::View;
                            app.load().await?;
                        }
                        KeyCode::Backspace => { app.draft.field_mut(app.field).pop(); }
                        KeyCode::Char(c) => app.draft.field_mut(app.field).push(c),
                        KeyCode::Tab => { app.field = app.field.next(); }
                        _ => {}
                    },
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use todo_api::domain::todo::TodoId;

    fn todo(id: i64, completed: bool) -> Todo {
        Todo { id: TodoId(id), title: format!("t{id}"), completed, due_date: None, priority: "medium".into(), category: "other".into(), created_at: Utc::now() }
    }

    #[test]
    fn stats_count_and_round() {
        assert_eq!(Stats::from_todos(&[]), Stats::default());
        let todos = [todo(1, true), todo(2, false), todo(3, false)];
        assert_eq!(Stats::from_todos(&todos), Stats { total: 3, completed: 1, pending: 2, rate: 33 });
        let todos = [todo(1, true), todo(2, true), todo(3, false)];
        assert_eq!(Stats::from_todos(&todos).rate, 67);
    }

    #[test]
    fn filter_cycles_and_selects() {
        assert_eq!(Filter::All.next().next().next(), Filter::All);
        assert!(Filter::Pending.includes(&todo(1, false)));
        assert!(!Filter::Pending.includes(&todo(1, true)));
        assert!(Filter::Completed.includes(&todo(1, true)));
    }

    #[test]
    fn edit_form_blank_fields_leave_values_alone() {
        let mut source = todo(1, false);
        source.due_date = NaiveDate::from_ymd_opt(2024, 3, 15);
        let mut draft = Draft::from_todo(&source);
        assert_eq!(draft.due_date, "2024-03-15");
        draft.title.clear();
        draft.due_date = "next week".into();
        let update = draft.into_update();
        assert_eq!(update.title, None);
        assert_eq!(update.due_date, None);
        assert_eq!(update.priority.as_deref(), Some("medium"));
    }
}
