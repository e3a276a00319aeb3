use crate::commands::FileNotebook;
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::collections::BTreeMap;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use stickies::model::{today, DeadlineStatus, Note, Theme, CATEGORY_PALETTE, NOTE_PALETTE};
use stickies::notebook::parse_deadline_input;
use stickies::{NewNote, NoteRef, NotebookError, Slot, StoreLocation};

pub fn run(book: FileNotebook, location: StoreLocation) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = App::new(book, location).and_then(|mut app| app.event_loop(&mut terminal));
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    book: FileNotebook,
    location: StoreLocation,
    colors: BTreeMap<String, String>,
    selected_column: usize,
    selected_note: usize,
    scroll_offsets: Vec<usize>,
    last_save: Instant,
    status: String,
    mode: Mode,
}

enum Mode {
    Normal,
    Creating(NoteForm),
    Editing { at: NoteRef, form: NoteForm },
    ConfirmDelete { at: NoteRef },
    AddingCategory(CategoryForm),
    ConfirmDeleteCategory { name: String, replacement: String },
}

struct NoteForm {
    title: FieldValue,
    body: FieldValue,
    deadline: FieldValue,
    field: FormField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormField {
    Title,
    Body,
    Deadline,
}

enum FormAction {
    Create,
    Edit(NoteRef),
}

struct CategoryForm {
    name: FieldValue,
    color_idx: usize,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        if let Some((idx, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.value.drain(idx..self.cursor);
            self.cursor = idx;
        }
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl App {
    fn new(mut book: FileNotebook, location: StoreLocation) -> Result<Self> {
        let colors = book.category_colors()?;
        let status = format!("Loaded notes from {}", location.path.display());
        let column_count = book.board().sections.len();
        Ok(App {
            book,
            location,
            colors,
            selected_column: 0,
            selected_note: 0,
            scroll_offsets: vec![0; column_count],
            last_save: Instant::now(),
            status,
            mode: Mode::Normal,
        })
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Creating(_) | Mode::Editing { .. } => self.handle_form_key(key),
            Mode::AddingCategory(_) => self.handle_category_form_key(key),
            Mode::ConfirmDelete { .. } | Mode::ConfirmDeleteCategory { .. } => {
                self.handle_confirm_key(key)
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Left | KeyCode::Char('h') => self.prev_column(),
            KeyCode::Right | KeyCode::Char('l') => self.next_column(),
            KeyCode::Up | KeyCode::Char('k') => self.prev_note(),
            KeyCode::Down | KeyCode::Char('j') => self.next_note(),
            KeyCode::Char('m') | KeyCode::Char('>') => self.move_selected(1)?,
            KeyCode::Char('b') | KeyCode::Char('<') => self.move_selected(-1)?,
            KeyCode::Char('K') => self.shift_selected(-1)?,
            KeyCode::Char('J') => self.shift_selected(1)?,
            KeyCode::Char('c') => self.cycle_note_color()?,
            KeyCode::Char('p') => self.cycle_category_color()?,
            KeyCode::Char('s') => {
                let result = self.book.sort_by_deadline();
                self.apply(result, |_| "Sorted by deadline".into())?;
            }
            KeyCode::Char('t') => {
                let result = self.book.toggle_theme();
                self.apply(result, |theme| format!("Theme: {}", theme.label()))?;
            }
            KeyCode::Char('n') => {
                if self.current_category().is_none() {
                    self.status = "Add a category before creating notes".into();
                } else {
                    self.mode = Mode::Creating(NoteForm::new());
                    self.status =
                        "Creating note (Tab/Shift-Tab move, Ctrl+Enter save, Esc cancel)".into();
                }
            }
            KeyCode::Char('e') => match self.current_ref() {
                Some(at) => {
                    if let Ok(note) = self.book.note(at) {
                        let form = NoteForm::from_note(note);
                        self.status = format!("Editing \"{}\"", note.title);
                        self.mode = Mode::Editing { at, form };
                    }
                }
                None => self.status = "No note selected to edit".into(),
            },
            KeyCode::Char('d') => match self.current_ref() {
                Some(at) => {
                    self.mode = Mode::ConfirmDelete { at };
                    self.status = "Delete note? (y to confirm, n/Esc to cancel)".into();
                }
                None => self.status = "No note selected to delete".into(),
            },
            KeyCode::Char('a') => {
                self.mode = Mode::AddingCategory(CategoryForm::new());
                self.status = "New category (Tab cycles color, Enter save, Esc cancel)".into();
            }
            KeyCode::Char('x') => self.prompt_delete_category(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let close_form = match &mut mode {
            Mode::Creating(form) => self.process_form_key(FormAction::Create, form, key)?,
            Mode::Editing { at, form } => {
                let at = *at;
                self.process_form_key(FormAction::Edit(at), form, key)?
            }
            _ => true,
        };
        self.mode = if close_form { Mode::Normal } else { mode };
        Ok(false)
    }

    fn process_form_key(
        &mut self,
        action: FormAction,
        form: &mut NoteForm,
        key: KeyEvent,
    ) -> Result<bool> {
        let mut close_form = false;
        match key.code {
            KeyCode::Esc => {
                close_form = true;
                self.status = "Canceled".into();
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Left => form.active_field_mut().move_left(),
            KeyCode::Right => form.active_field_mut().move_right(),
            KeyCode::Enter => {
                let control = key.modifiers.contains(KeyModifiers::CONTROL);
                if form.field == FormField::Body && !control {
                    form.active_field_mut().insert_char('\n');
                } else {
                    close_form = self.try_submit(action, form)?;
                }
            }
            KeyCode::Backspace => form.active_field_mut().backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    form.active_field_mut().insert_char(c);
                }
            }
            _ => {}
        }
        Ok(close_form)
    }

    fn try_submit(&mut self, action: FormAction, form: &NoteForm) -> Result<bool> {
        let deadline = match parse_deadline_input(&form.deadline.value) {
            Ok(d) => d,
            Err(err) => {
                self.status = err.to_string();
                return Ok(false);
            }
        };
        let title = form.title.value.clone();
        let body = form.body.value.clone();
        match action {
            FormAction::Create => {
                let category = self.current_category();
                let result = self.book.create_note(NewNote {
                    title: Some(title),
                    body: Some(body),
                    color: None,
                    category,
                    deadline,
                });
                if let Some(at) = self.apply(result, |_| "Created note".into())? {
                    self.select(at);
                    return Ok(true);
                }
                Ok(false)
            }
            FormAction::Edit(at) => {
                let result = self.book.update_note(at, move |note| {
                    if !title.trim().is_empty() {
                        note.title = title.trim().to_string();
                    }
                    note.body = body;
                    note.deadline = deadline;
                });
                Ok(self.apply(result, |_| "Updated note".into())?.is_some())
            }
        }
    }

    fn handle_category_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut form = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::AddingCategory(form) => form,
            other => {
                self.mode = other;
                return Ok(false);
            }
        };
        let mut close_form = false;
        match key.code {
            KeyCode::Esc => {
                close_form = true;
                self.status = "Canceled".into();
            }
            KeyCode::Tab => form.color_idx = (form.color_idx + 1) % CATEGORY_PALETTE.len(),
            KeyCode::BackTab => {
                form.color_idx =
                    (form.color_idx + CATEGORY_PALETTE.len() - 1) % CATEGORY_PALETTE.len()
            }
            KeyCode::Left => form.name.move_left(),
            KeyCode::Right => form.name.move_right(),
            KeyCode::Backspace => form.name.backspace(),
            KeyCode::Enter => {
                let color = CATEGORY_PALETTE[form.color_idx].1;
                let result = self.book.add_category(&form.name.value, Some(color));
                if let Some(name) = self.apply(result, |name| format!("Added category {}", name))? {
                    self.refresh_colors()?;
                    self.selected_column = self.book.board().section_index(&name).unwrap_or(0);
                    self.selected_note = 0;
                    close_form = true;
                }
            }
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    form.name.insert_char(c);
                }
            }
            _ => {}
        }
        if !close_form {
            self.mode = Mode::AddingCategory(form);
        }
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match std::mem::replace(&mut self.mode, Mode::Normal) {
                    Mode::ConfirmDelete { at } => {
                        let result = self.book.delete_note(at);
                        if self
                            .apply(result, |note| format!("Deleted \"{}\"", note.title))?
                            .is_some()
                        {
                            self.clamp_selection();
                        }
                    }
                    Mode::ConfirmDeleteCategory { name, .. } => {
                        let result = self.book.delete_category(&name);
                        if self
                            .apply(result, |r| format!("Deleted {}; notes moved to {}", name, r))?
                            .is_some()
                        {
                            self.refresh_colors()?;
                            self.selected_column =
                                self.selected_column.min(self.column_count().saturating_sub(1));
                            self.clamp_selection();
                        }
                    }
                    other => self.mode = other,
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn prompt_delete_category(&mut self) {
        let Some(name) = self.current_category() else {
            self.status = "No category selected".into();
            return;
        };
        let categories = self.book.categories();
        if categories.len() <= 1 {
            self.status = "Cannot delete the only remaining category".into();
            return;
        }
        let replacement = categories
            .into_iter()
            .find(|c| *c != name)
            .unwrap_or_default();
        self.status = format!("Delete {}? (y to confirm, n/Esc to cancel)", name);
        self.mode = Mode::ConfirmDeleteCategory { name, replacement };
    }

    /// Records the outcome of a notebook command in the status bar. Store
    /// failures end the session; everything else is reported and skipped.
    fn apply<T>(
        &mut self,
        result: Result<T, NotebookError>,
        message: impl FnOnce(&T) -> String,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => {
                self.status = message(&value);
                self.last_save = Instant::now();
                Ok(Some(value))
            }
            Err(NotebookError::Store(err)) => Err(err.into()),
            Err(err) => {
                tracing::debug!("command rejected: {}", err);
                self.status = err.to_string();
                Ok(None)
            }
        }
    }

    fn refresh_colors(&mut self) -> Result<()> {
        self.colors = self.book.category_colors()?;
        Ok(())
    }

    fn move_selected(&mut self, delta: isize) -> Result<()> {
        let Some(at) = self.current_ref() else {
            self.status = "No note selected to move".into();
            return Ok(());
        };
        let max = self.column_count() as isize - 1;
        let target = (self.selected_column as isize + delta).clamp(0, max.max(0)) as usize;
        if target == self.selected_column {
            return Ok(());
        }
        let dest = self.book.board().sections[target].category.clone();
        let result = self.book.move_note(at, &dest);
        if let Some(moved) = self.apply(result, |_| format!("Moved to {}", dest))? {
            self.select(moved);
        }
        Ok(())
    }

    fn shift_selected(&mut self, delta: isize) -> Result<()> {
        let Some(at) = self.current_ref() else {
            return Ok(());
        };
        let result = self.book.shift_note(at, delta);
        if let Some(shifted) = self.apply(result, |_| "Reordered".into())? {
            self.select(shifted);
        }
        Ok(())
    }

    fn cycle_note_color(&mut self) -> Result<()> {
        let Some(at) = self.current_ref() else {
            self.status = "No note selected".into();
            return Ok(());
        };
        let current = self.book.note(at).map(|n| n.color.clone()).unwrap_or_default();
        let (name, value) = next_in_palette(&NOTE_PALETTE, &current);
        let result = self.book.set_note_color(at, value);
        self.apply(result, |_| format!("Note color: {}", name))?;
        Ok(())
    }

    fn cycle_category_color(&mut self) -> Result<()> {
        let Some(category) = self.current_category() else {
            return Ok(());
        };
        let current = self.colors.get(&category).cloned().unwrap_or_default();
        let (name, value) = next_in_palette(&CATEGORY_PALETTE, &current);
        let result = self.book.set_category_color(&category, value);
        if self
            .apply(result, |_| format!("{} color: {}", category, name))?
            .is_some()
        {
            self.refresh_colors()?;
        }
        Ok(())
    }

    fn column_count(&self) -> usize {
        self.book.board().sections.len()
    }

    fn current_category(&self) -> Option<String> {
        self.book
            .board()
            .sections
            .get(self.selected_column)
            .map(|s| s.category.clone())
    }

    fn current_ref(&self) -> Option<NoteRef> {
        let at = NoteRef::new(Slot::Section(self.selected_column), self.selected_note);
        self.book.board().get(at).map(|_| at)
    }

    fn select(&mut self, at: NoteRef) {
        if let Slot::Section(idx) = at.slot {
            self.selected_column = idx;
            self.selected_note = at.index;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self
            .book
            .board()
            .sections
            .get(self.selected_column)
            .map(|s| s.notes.len())
            .unwrap_or(0);
        self.selected_note = self.selected_note.min(len.saturating_sub(1));
    }

    fn prev_column(&mut self) {
        if self.selected_column > 0 {
            self.selected_column -= 1;
            self.selected_note = 0;
        }
    }

    fn next_column(&mut self) {
        if self.selected_column + 1 < self.column_count() {
            self.selected_column += 1;
            self.selected_note = 0;
        }
    }

    fn prev_note(&mut self) {
        if self.selected_note > 0 {
            self.selected_note -= 1;
        }
    }

    fn next_note(&mut self) {
        if let Some(section) = self.book.board().sections.get(self.selected_column) {
            if self.selected_note + 1 < section.notes.len() {
                self.selected_note += 1;
            }
        }
    }

    fn palette(&self) -> Palette {
        Palette::for_theme(self.book.theme())
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_board(f, layout[1]);
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Creating(form) => self.draw_form(f, "New Note", form),
            Mode::Editing { form, .. } => self.draw_form(f, "Edit Note", form),
            Mode::AddingCategory(form) => self.draw_category_form(f, form),
            Mode::ConfirmDelete { at } => {
                let title = self
                    .book
                    .board()
                    .get(*at)
                    .map(|n| n.title.clone())
                    .unwrap_or_default();
                self.draw_confirm(f, &format!("Delete \"{}\"?", title), None);
            }
            Mode::ConfirmDeleteCategory { name, replacement } => self.draw_confirm(
                f,
                &format!("Delete category \"{}\"?", name),
                Some(format!("Its notes will move to {}", replacement)),
            ),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let palette = self.palette();
        let title = Line::from(vec![
            Span::styled(
                "stickies ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.location.scope.label(),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.path.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} theme", self.book.theme().label()),
                Style::default().fg(Color::Magenta),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(palette.background).fg(palette.text));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_board(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let palette = self.palette();
        let board = self.book.board();
        if board.sections.is_empty() {
            let msg = format!(
                "No categories ({} unfiled notes). Press a to add one.",
                board.unfiled.len()
            );
            let msg = Paragraph::new(msg)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("stickies"));
            f.render_widget(Clear, area);
            f.render_widget(msg, area);
            return;
        }

        if self.scroll_offsets.len() != board.sections.len() {
            self.scroll_offsets.resize(board.sections.len(), 0);
        }

        let chunk_constraints = board
            .sections
            .iter()
            .map(|_| Constraint::Percentage((100 / board.sections.len() as u16).max(1)))
            .collect::<Vec<_>>();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(chunk_constraints)
            .split(area);

        let today = today();
        for (idx, section) in board.sections.iter().enumerate() {
            let accent = self
                .colors
                .get(&section.category)
                .and_then(|c| css_color(c, palette.background))
                .unwrap_or(Color::Cyan);
            let note_width = chunks[idx].width.saturating_sub(2);
            let notes = section
                .notes
                .iter()
                .enumerate()
                .map(|(n_idx, note)| {
                    note_item(
                        note,
                        note_width,
                        idx == self.selected_column && n_idx == self.selected_note,
                        today,
                        &palette,
                    )
                })
                .collect::<Vec<_>>();
            let mut state = ListState::default();
            let viewport = chunks[idx].height.saturating_sub(2) as usize / NOTE_HEIGHT;
            let mut offset = self.scroll_offsets[idx];
            if idx == self.selected_column {
                offset = adjust_offset(self.selected_note, offset, viewport, notes.len());
                self.scroll_offsets[idx] = offset;
                state.select(Some(self.selected_note));
            }
            *state.offset_mut() = offset.min(notes.len().saturating_sub(1));

            let title = format!("{} ({})", section.category, section.notes.len());
            let block = Block::default()
                .title(Span::styled(
                    title,
                    Style::default()
                        .fg(accent)
                        .add_modifier(if idx == self.selected_column {
                            Modifier::BOLD | Modifier::UNDERLINED
                        } else {
                            Modifier::BOLD
                        }),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent))
                .style(Style::default().bg(palette.background));

            let list = List::new(notes).block(block);
            f.render_stateful_widget(list, chunks[idx], &mut state);
        }
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let detail = match self.current_ref().and_then(|at| self.book.board().get(at)) {
            Some(note) => selected_note_detail(note, today()),
            None => Line::from("No note selected"),
        };
        let detail = Paragraph::new(detail)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title("Note"),
            );
        f.render_widget(detail, bottom[1]);
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, title: &str, form: &NoteForm) {
        let area = centered_rect(70, 60, f.size());
        let mut fields = Vec::new();
        fields.extend(field_lines(
            "Title",
            &form.title,
            form.field == FormField::Title,
        ));
        fields.extend(field_lines(
            "Body",
            &form.body,
            form.field == FormField::Body,
        ));
        fields.extend(field_lines(
            "Deadline (dd/mm-yyyy, optional)",
            &form.deadline,
            form.field == FormField::Deadline,
        ));
        fields.push(Line::from(Span::styled(
            "Ctrl+Enter to save • Esc to cancel • Tab/Shift-Tab to move • Enter adds newline in Body",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(fields)
            .block(dialog_block(title, Color::Cyan))
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_category_form(&self, f: &mut ratatui::Frame<'_>, form: &CategoryForm) {
        let area = centered_rect(50, 40, f.size());
        let palette = self.palette();
        let mut lines = field_lines("Name", &form.name, true);
        let (color_name, color_value) = CATEGORY_PALETTE[form.color_idx];
        let swatch = css_color(color_value, palette.background).unwrap_or(Color::Cyan);
        lines.push(Line::from(vec![
            Span::styled("Color: ", Style::default().fg(Color::Gray)),
            Span::styled("    ", Style::default().bg(swatch)),
            Span::raw(" "),
            Span::styled(color_name, Style::default().fg(swatch)),
        ]));
        lines.push(Line::from(Span::styled(
            "Enter to create • Tab to cycle color • Esc to cancel",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(lines)
            .block(dialog_block("New Category", Color::Cyan))
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, question: &str, detail: Option<String>) {
        let area = centered_rect(50, 30, f.size());
        let mut body = vec![Line::from(Span::styled(
            question.to_string(),
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        ))];
        if let Some(detail) = detail {
            body.push(Line::from(detail));
        }
        body.push(Line::from(""));
        body.push(Line::from("Press y to confirm, n or Esc to cancel"));
        let dialog = Paragraph::new(body)
            .alignment(Alignment::Center)
            .block(dialog_block("Confirm Delete", Color::LightRed));
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

impl NoteForm {
    fn new() -> Self {
        NoteForm {
            title: FieldValue::new(stickies::model::DEFAULT_NOTE_TITLE),
            body: FieldValue::new(stickies::model::DEFAULT_NOTE_BODY),
            deadline: FieldValue::new(""),
            field: FormField::Title,
        }
    }

    fn from_note(note: &Note) -> Self {
        NoteForm {
            title: FieldValue::new(&note.title),
            body: FieldValue::new(&note.body),
            deadline: FieldValue::new(
                &note.deadline.map(|d| d.to_string()).unwrap_or_default(),
            ),
            field: FormField::Title,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Body,
            FormField::Body => FormField::Deadline,
            FormField::Deadline => FormField::Title,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Deadline,
            FormField::Body => FormField::Title,
            FormField::Deadline => FormField::Body,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            FormField::Title => &mut self.title,
            FormField::Body => &mut self.body,
            FormField::Deadline => &mut self.deadline,
        }
    }
}

impl CategoryForm {
    fn new() -> Self {
        CategoryForm {
            name: FieldValue::new(""),
            color_idx: 0,
        }
    }
}

/// Screen colors for the light and dark themes.
struct Palette {
    background: Color,
    text: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                background: Color::Rgb(16, 18, 24),
                text: Color::Gray,
            },
            Theme::Light => Palette {
                background: Color::Rgb(244, 244, 238),
                text: Color::Black,
            },
        }
    }
}

const NOTE_HEIGHT: usize = 4;

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn dialog_block(title: &str, accent: Color) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
}

fn footer_help_line() -> Line<'static> {
    let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
    Line::from(vec![
        key("←↑↓→ / h j k l", Color::LightCyan),
        Span::raw(" select  "),
        key("m/b", Color::LightGreen),
        Span::raw(" move  "),
        key("K/J", Color::LightGreen),
        Span::raw(" reorder  "),
        key("n", Color::LightMagenta),
        Span::raw(" new  "),
        key("e", Color::LightYellow),
        Span::raw(" edit  "),
        key("c", Color::LightYellow),
        Span::raw(" color  "),
        key("s", Color::LightYellow),
        Span::raw(" sort  "),
        key("a/x/p", Color::LightMagenta),
        Span::raw(" category add/delete/color  "),
        key("t", Color::LightCyan),
        Span::raw(" theme  "),
        key("d", Color::LightRed),
        Span::raw(" delete  "),
        key("q", Color::LightRed),
        Span::raw(" quit"),
    ])
}

/// Returns the palette entry after the one whose value is `current`, or the
/// first entry when `current` is not in the palette.
fn next_in_palette(
    palette: &[(&'static str, &'static str)],
    current: &str,
) -> (&'static str, &'static str) {
    let next = palette
        .iter()
        .position(|(_, value)| *value == current)
        .map(|idx| (idx + 1) % palette.len())
        .unwrap_or(0);
    palette[next]
}

/// Converts `#rgb`, `#rrggbb`, `rgb(..)` and `rgba(..)` into a terminal color.
/// Alpha is blended over `background`.
fn css_color(input: &str, background: Color) -> Option<Color> {
    let input = input.trim();
    if let Some(hex) = input.strip_prefix('#') {
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }
    let inner = input
        .strip_prefix("rgba(")
        .or_else(|| input.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 3 || parts.len() > 4 {
        return None;
    }
    let r: u8 = parts[0].parse().ok()?;
    let g: u8 = parts[1].parse().ok()?;
    let b: u8 = parts[2].parse().ok()?;
    let alpha: f32 = match parts.get(3) {
        Some(a) => a.parse().ok()?,
        None => 1.0,
    };
    let (br, bg, bb) = match background {
        Color::Rgb(r, g, b) => (r, g, b),
        _ => (0, 0, 0),
    };
    let blend = |fg: u8, bg: u8| -> u8 {
        let a = alpha.clamp(0.0, 1.0);
        (fg as f32 * a + bg as f32 * (1.0 - a)).round() as u8
    };
    Some(Color::Rgb(blend(r, br), blend(g, bg), blend(b, bb)))
}

fn status_style(status: DeadlineStatus) -> Style {
    match status {
        DeadlineStatus::Overdue => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
        DeadlineStatus::Approaching => Style::default()
            .fg(Color::Rgb(200, 110, 0))
            .add_modifier(Modifier::BOLD),
        DeadlineStatus::None => Style::default(),
    }
}

fn adjust_offset(selected: usize, current_offset: usize, viewport: usize, len: usize) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let mut offset = current_offset.min(max_offset);
    if selected < offset {
        offset = selected;
    } else if selected >= offset + viewport {
        offset = selected + 1 - viewport;
    }
    offset
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&"...".chars().take(max - keep).collect::<String>());
    out
}

fn note_item(
    note: &Note,
    width: u16,
    selected: bool,
    today: NaiveDate,
    palette: &Palette,
) -> ListItem<'static> {
    let inner = width.saturating_sub(2).max(6) as usize;
    let status = note.status_on(today);
    let marker = if selected { "▶ " } else { "  " };
    let title = truncate_text(&note.title, inner.saturating_sub(2));
    let body = truncate_text(note.body.lines().next().unwrap_or(""), inner.saturating_sub(2));
    let deadline = match note.deadline {
        Some(d) if status != DeadlineStatus::None => format!("⏰ {} {}", d, status.label()),
        Some(d) => format!("⏰ {}", d),
        None => String::new(),
    };
    let lines = vec![
        Line::from(vec![
            Span::raw(marker),
            Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::raw(format!("  {}", body)),
        Line::from(Span::styled(
            format!("  {}", truncate_text(&deadline, inner.saturating_sub(2))),
            status_style(status),
        )),
        Line::raw(""),
    ];
    let bg = css_color(&note.color, palette.background).unwrap_or(palette.background);
    let mut style = Style::default().bg(bg).fg(Color::Black);
    if selected {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }
    ListItem::new(lines).style(style)
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            Line::from(vec![
                Span::styled(
                    if idx == 0 {
                        prefix.clone()
                    } else {
                        spacer.clone()
                    },
                    label_style,
                ),
                Span::styled(line.to_string(), value_style),
            ])
        })
        .collect()
}

fn selected_note_detail(note: &Note, today: NaiveDate) -> Line<'static> {
    let mut spans = vec![Span::styled(
        note.title.clone(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(deadline) = note.deadline {
        let days = deadline.days_remaining(today);
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} ({} days)", deadline, days),
            status_style(note.status_on(today)),
        ));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        note.body.replace('\n', " "),
        Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
    ));
    Line::from(spans)
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse() {
        let bg = Color::Rgb(0, 0, 0);
        assert_eq!(css_color("#fff9a6", bg), Some(Color::Rgb(255, 249, 166)));
        assert_eq!(css_color("#0f0", bg), Some(Color::Rgb(0, 255, 0)));
        assert_eq!(css_color("#12", bg), None);
    }

    #[test]
    fn rgba_blends_over_background() {
        let bg = Color::Rgb(0, 0, 0);
        assert_eq!(
            css_color("rgba(138, 43, 226, 0.5)", bg),
            Some(Color::Rgb(69, 22, 113))
        );
        assert_eq!(css_color("rgb(1, 2, 3)", bg), Some(Color::Rgb(1, 2, 3)));
        assert_eq!(css_color("hsl(1, 2, 3)", bg), None);
    }

    #[test]
    fn palette_cycles_and_wraps() {
        assert_eq!(next_in_palette(&NOTE_PALETTE, "#fff9a6").0, "Blue");
        assert_eq!(next_in_palette(&NOTE_PALETTE, "#ffd1dc").0, "Yellow");
        assert_eq!(next_in_palette(&NOTE_PALETTE, "salmon").0, "Yellow");
    }

    #[test]
    fn field_editing_respects_char_boundaries() {
        let mut field = FieldValue::new("né");
        field.backspace();
        assert_eq!(field.value, "n");
        field.move_left();
        field.insert_char('a');
        assert_eq!(field.value, "an");
        field.move_right();
        field.move_right();
        assert_eq!(field.cursor, 2);
    }

    #[test]
    fn offset_keeps_selection_visible() {
        assert_eq!(adjust_offset(0, 0, 3, 10), 0);
        assert_eq!(adjust_offset(5, 0, 3, 10), 3);
        assert_eq!(adjust_offset(1, 3, 3, 10), 1);
        assert_eq!(adjust_offset(4, 0, 0, 10), 0);
    }

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a long title", 8), "a lon...");
        assert_eq!(truncate_text("abc", 0), "");
    }
}
