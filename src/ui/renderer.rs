/// Terminal view of a play session, drawn with a two-frame diff.
///
/// Each render composes the whole screen into `front`, writes only the
/// glyphs that differ from `back` (queued, one flush per frame), then
/// swaps the two. A resize or level change invalidates `back` so the next
/// frame repaints everything.
///
/// Board cells are `CELL_W` terminal columns wide. One glyph shows the most
/// important tag in the cell; the background shows the floor underneath
/// (spikes, target, laser beam).

use std::collections::HashSet;
use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use hellgrid::{Board, Cell, Coordinate, Direction, EntityTag};

use crate::session::{Phase, Session};
use crate::ui::input::{Command, KeyMap};

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit background for every cell so gaps never show the
    /// terminal's own default colour.
    const BASE_BG: Color = Color::Rgb { r: 24, g: 14, b: 18 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Never drawn; forces a full repaint when written into `back`.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Glyph::BASE_BG,
            other => other,
        };
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    glyphs: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, glyphs: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.glyphs = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.glyphs.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, glyph: Glyph) {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x] = glyph;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 70, g: 16, b: 24 };
const BEAM_BG: Color = Color::Rgb { r: 110, g: 20, b: 20 };
const SPIKE_BG: Color = Color::Rgb { r: 90, g: 60, b: 60 };
const TARGET_BG: Color = Color::Rgb { r: 120, g: 90, b: 20 };
const WIN_C: Color = Color::Rgb { r: 255, g: 220, b: 80 };
const LOSE_C: Color = Color::Rgb { r: 255, g: 70, b: 70 };
const DIM_C: Color = Color::DarkGrey;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_level: Option<usize>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_level: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.glyphs.fill(Glyph::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, session: &Session, keymap: &KeyMap) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.term_w || th as usize != self.term_h;
        let level_changed = self.last_level != Some(session.level_index());
        if resized || level_changed {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.glyphs.fill(Glyph::INVALID);
            self.last_level = Some(session.level_index());
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose(session, keymap);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let glyph = self.front.get(x, y);
                if glyph == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if glyph.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(glyph.fg))?;
                    last_fg = glyph.fg;
                }
                if glyph.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(glyph.bg))?;
                    last_bg = glyph.bg;
                }
                queue!(self.writer, Print(glyph.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, session: &Session, keymap: &KeyMap) {
        let game = &session.game;

        // ── HUD row ──
        let key = if game.actor.has_key { "  ⚿ key" } else { "" };
        let rules: Vec<&str> = game.rules.iter().map(|r| r.name).collect();
        let hud = format!(
            " {}/{}  {}  │  Willpower {:>3}{}  │  {}",
            session.level_index() + 1,
            session.level_count(),
            session.level_name(),
            game.remaining_willpower(),
            key,
            rules.join(" + "),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        let beam = lit_cells(&game.board);
        for c in game.board.coordinates() {
            let col = MAP_COL + c.column as usize * CELL_W;
            let row = MAP_ROW + c.row as usize;
            let cell = game.board.cell(c).unwrap_or_default();
            let (ch, fg) = glyph_for(cell);
            let bg = floor_for(cell, beam.contains(&c));
            self.front.set(col, row, Glyph::new(ch, fg, bg));
            self.front.set(col + 1, row, Glyph::new(' ', fg, bg));
        }

        // ── Status ──
        let mut row = MAP_ROW + game.board.height() + 1;
        let (status, color) = match session.phase {
            Phase::Playing => (session.message.clone(), Color::Grey),
            Phase::Won(_) => (format!("★ {}", session.message), WIN_C),
            Phase::Lost(_) => (format!("✕ {}", session.message), LOSE_C),
        };
        self.front.put_str(MAP_COL, row, &status, color, Color::Reset);
        row += 1;

        if !game.log.is_empty() {
            let tokens = game.log.tokens();
            let budget = self.front.width.saturating_sub(MAP_COL + 8) / 7;
            let tail = tokens.len().saturating_sub(budget.max(1));
            let text = format!("Log: {}{}", if tail > 0 { "… " } else { "" }, tokens[tail..].join(" "));
            self.front.put_str(MAP_COL, row, &text, DIM_C, Color::Reset);
        }
        row += 2;

        // ── Help bar ──
        let help = help_line(keymap, session.can_undo());
        self.front.put_str(MAP_COL, row, &help, DIM_C, Color::Reset);
    }
}

/// Key hints. Undo is listed only while there is a turn to take back.
fn help_line(keymap: &KeyMap, can_undo: bool) -> String {
    let undo = if can_undo { format!("   {} undo", keymap.label(Command::Undo)) } else { String::new() };
    format!(
        "{}{}{}{} move   {} restart{}   {}/{} level   {} save   {} quit",
        keymap.label(Command::Move(Direction::Up)),
        keymap.label(Command::Move(Direction::Down)),
        keymap.label(Command::Move(Direction::Left)),
        keymap.label(Command::Move(Direction::Right)),
        keymap.label(Command::Restart),
        undo,
        keymap.label(Command::PrevLevel),
        keymap.label(Command::NextLevel),
        keymap.label(Command::Save),
        keymap.label(Command::Quit),
    )
}

/// Every coordinate currently covered by a laser beam.
fn lit_cells(board: &Board) -> HashSet<Coordinate> {
    EntityTag::LASERS
        .iter()
        .flat_map(|tag| board.find_all(*tag))
        .filter_map(|emitter| board.cast_ray(emitter).ok())
        .flatten()
        .collect()
}

/// Foreground glyph: the most prominent tag wins.
fn glyph_for(cell: Cell) -> (char, Color) {
    const PRIORITY: [(EntityTag, char, Color); 14] = [
        (EntityTag::Actor, '@', Color::White),
        (EntityTag::Enemy, '&', Color::Rgb { r: 230, g: 230, b: 200 }),
        (EntityTag::Block, '■', Color::Rgb { r: 170, g: 140, b: 110 }),
        (EntityTag::Wall, '█', Color::Rgb { r: 90, g: 70, b: 80 }),
        (EntityTag::Gate, '#', Color::Rgb { r: 220, g: 180, b: 60 }),
        (EntityTag::TerminalActive, '▣', Color::Rgb { r: 80, g: 220, b: 255 }),
        (EntityTag::TerminalBroken, '▢', Color::DarkGrey),
        (EntityTag::LaserUp, '▲', Color::Red),
        (EntityTag::LaserRight, '▶', Color::Red),
        (EntityTag::LaserDown, '▼', Color::Red),
        (EntityTag::LaserLeft, '◀', Color::Red),
        (EntityTag::Key, '⚿', Color::Rgb { r: 255, g: 220, b: 80 }),
        (EntityTag::Target, '♥', Color::Rgb { r: 255, g: 110, b: 160 }),
        (EntityTag::SpikesActive, '^', Color::Rgb { r: 230, g: 230, b: 230 }),
    ];
    PRIORITY
        .iter()
        .find(|(tag, _, _)| cell.has(*tag))
        .map(|&(_, ch, fg)| (ch, fg))
        .unwrap_or(if cell.has(EntityTag::SpikesInactive) { ('.', DIM_C) } else { (' ', Color::White) })
}

fn floor_for(cell: Cell, lit: bool) -> Color {
    if lit {
        BEAM_BG
    } else if cell.has(EntityTag::Target) {
        TARGET_BG
    } else if cell.has(EntityTag::SpikesActive) {
        SPIKE_BG
    } else {
        Glyph::BASE_BG
    }
}
