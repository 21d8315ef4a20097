/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame from a `Snapshot` into the `front` buffer
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!` and flush once at the end
///   5. Swap front/back
///
/// The play field is measured in pixels; the `Viewport` maps it onto a grid
/// of square-ish cells, each two terminal columns wide. The renderer only
/// reads snapshots. It never touches the session.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::rect::Rect;
use crate::sim::driver::RenderSurface;
use crate::sim::session::{Phase, Snapshot};

// ── Palette ──

const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const SKY: Color = Color::Rgb { r: 28, g: 40, b: 72 };
const FRAME: Color = Color::Rgb { r: 90, g: 90, b: 120 };
const PIPE: Color = Color::Rgb { r: 60, g: 180, b: 75 };
const PIPE_EDGE: Color = Color::Rgb { r: 30, g: 120, b: 45 };
const BIRD: Color = Color::Rgb { r: 250, g: 210, b: 40 };
const OVERLAY: Color = Color::Rgb { r: 40, g: 40, b: 40 };
const TITLE: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const ALERT: Color = Color::Rgb { r: 255, g: 80, b: 80 };
const ACTION: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const DIM: Color = Color::Rgb { r: 140, g: 140, b: 160 };

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Differs from every real cell, so the next flush repaints everything.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }

    fn fill(bg: Color) -> Self {
        Cell { ch: ' ', fg: Color::White, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies one column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Write a string centred between columns `left` and `left + span`.
    fn put_centered(&mut self, left: usize, span: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = left + span.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Viewport: field pixels → terminal cells ──

/// Terminal columns per grid cell. Terminal cells are about twice as tall as
/// they are wide, so two columns make a roughly square cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
/// Top border row; the field itself starts one row below.
const FRAME_ROW: usize = 1;
/// HUD + top border + bottom border + help line.
const RESERVED_ROWS: usize = 4;

#[derive(Clone, Copy, PartialEq, Debug)]
struct Viewport {
    /// Terminal column of the first field cell.
    col: usize,
    /// Terminal row of the first field cell.
    row: usize,
    cells_w: usize,
    cells_h: usize,
    /// Field pixels per grid cell, same on both axes.
    scale: f64,
    field_w: f64,
    field_h: f64,
}

impl Viewport {
    /// Fit the whole field into the terminal, keeping its aspect ratio.
    /// `None` when the terminal is too small to show anything useful.
    fn fit(field_w: f64, field_h: f64, term_w: usize, term_h: usize) -> Option<Self> {
        let avail_w = term_w.saturating_sub(2) / CELL_W;
        let avail_h = term_h.saturating_sub(RESERVED_ROWS);
        if avail_w < 8 || avail_h < 8 || field_w <= 0.0 || field_h <= 0.0 {
            return None;
        }

        let scale = (field_w / avail_w as f64).max(field_h / avail_h as f64);
        let cells_w = ((field_w / scale).ceil() as usize).min(avail_w);
        let cells_h = ((field_h / scale).ceil() as usize).min(avail_h);

        Some(Viewport {
            col: (term_w - cells_w * CELL_W) / 2,
            row: FRAME_ROW + 1,
            cells_w,
            cells_h,
            scale,
            field_w,
            field_h,
        })
    }

    /// Grid cells covered by `r`, clipped to the field, as
    /// `(x0, y0, x1, y1)` with exclusive ends. `None` when nothing is visible.
    fn cell_span(&self, r: &Rect) -> Option<(usize, usize, usize, usize)> {
        let x0 = r.x.max(0.0);
        let x1 = r.right().min(self.field_w);
        let y0 = r.y.max(0.0);
        let y1 = r.bottom().min(self.field_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let gx0 = (x0 / self.scale).floor() as usize;
        let gy0 = (y0 / self.scale).floor() as usize;
        let gx1 = ((x1 / self.scale).ceil() as usize).min(self.cells_w);
        let gy1 = ((y1 / self.scale).ceil() as usize).min(self.cells_h);
        if gx1 <= gx0 || gy1 <= gy0 {
            return None;
        }
        Some((gx0, gy0, gx1, gy1))
    }

    fn term_width(&self) -> usize {
        self.cells_w * CELL_W
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, snap: &Snapshot) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clean transition
        if self.last_phase != Some(snap.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(snap.phase);
        }

        self.compose(snap);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors. ResetColor would fall back to the terminal's
        // own default, which may not match BASE_BG.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, snap: &Snapshot) {
        self.front.clear();

        let Some(vp) = Viewport::fit(snap.field_width, snap.field_height, self.front.width, self.front.height)
        else {
            self.front.put_str(0, 0, "Terminal too small", ALERT, BASE_BG);
            self.front.put_str(0, 1, "ESC: Quit", DIM, BASE_BG);
            return;
        };

        self.compose_field(snap, &vp);
        self.compose_hud(snap, &vp);

        match snap.phase {
            Phase::Idle => self.compose_title(snap, &vp),
            Phase::Running => {}
            Phase::GameOver => self.compose_game_over(snap, &vp),
        }

        let help = match snap.phase {
            Phase::Idle => "ENTER / SPACE: Play   ESC / Q: Quit",
            Phase::Running => "SPACE / any key: Flap   ESC / Q: Quit",
            Phase::GameOver => "ENTER: Play Again   ESC / Q: Quit",
        };
        let help_row = vp.row + vp.cells_h + 1;
        self.front.put_centered(vp.col, vp.term_width(), help_row, help, DIM, BASE_BG);
    }

    fn compose_field(&mut self, snap: &Snapshot, vp: &Viewport) {
        let left = vp.col.saturating_sub(1);
        let right = vp.col + vp.term_width();
        let top = FRAME_ROW;
        let bottom = vp.row + vp.cells_h;

        // Border
        for x in left..=right {
            self.front.set(x, top, Cell::new('─', FRAME, BASE_BG));
            self.front.set(x, bottom, Cell::new('─', FRAME, BASE_BG));
        }
        for y in top..=bottom {
            self.front.set(left, y, Cell::new('│', FRAME, BASE_BG));
            self.front.set(right, y, Cell::new('│', FRAME, BASE_BG));
        }
        self.front.set(left, top, Cell::new('┌', FRAME, BASE_BG));
        self.front.set(right, top, Cell::new('┐', FRAME, BASE_BG));
        self.front.set(left, bottom, Cell::new('└', FRAME, BASE_BG));
        self.front.set(right, bottom, Cell::new('┘', FRAME, BASE_BG));

        // Sky
        for y in vp.row..bottom {
            for x in vp.col..right {
                self.front.set(x, y, Cell::fill(SKY));
            }
        }

        for pipe in &snap.pipes {
            if let Some((gx0, gy0, gx1, gy1)) = vp.cell_span(pipe) {
                for gy in gy0..gy1 {
                    for gx in gx0..gx1 {
                        let edge = gx == gx0 || gx + 1 == gx1;
                        let bg = if edge { PIPE_EDGE } else { PIPE };
                        self.fill_grid_cell(vp, gx, gy, Cell::fill(bg));
                    }
                }
            }
        }

        // Bird last so it stays visible when it clips a pipe.
        if let Some((gx0, gy0, gx1, gy1)) = vp.cell_span(&snap.bird) {
            for gy in gy0..gy1 {
                for gx in gx0..gx1 {
                    self.fill_grid_cell(vp, gx, gy, Cell::fill(BIRD));
                }
            }
        }
    }

    fn fill_grid_cell(&mut self, vp: &Viewport, gx: usize, gy: usize, cell: Cell) {
        let x = vp.col + gx * CELL_W;
        let y = vp.row + gy;
        for dx in 0..CELL_W {
            self.front.set(x + dx, y, cell);
        }
    }

    fn compose_hud(&mut self, snap: &Snapshot, vp: &Viewport) {
        let left = format!("Score: {}", snap.score);
        let right = format!("High Score: {}", snap.high_score);
        self.front.put_str(vp.col, HUD_ROW, &left, Color::White, BASE_BG);
        let rx = (vp.col + vp.term_width()).saturating_sub(right.chars().count());
        self.front.put_str(rx, HUD_ROW, &right, TITLE, BASE_BG);

        if snap.phase == Phase::Running {
            let speed = format!("Speed {}", snap.pipe_speed);
            self.front.put_centered(vp.col, vp.term_width(), HUD_ROW, &speed, DIM, BASE_BG);
        }
    }

    /// Dark box centred on the field, one line of text per entry.
    fn compose_box(&mut self, vp: &Viewport, lines: &[(&str, Color)]) {
        let widest = lines.iter().map(|(s, _)| s.chars().count()).max().unwrap_or(0);
        let box_w = (widest + 6).min(vp.term_width());
        let box_h = (lines.len() + 2).min(vp.cells_h);
        let box_x = vp.col + (vp.term_width() - box_w) / 2;
        let box_y = vp.row + (vp.cells_h - box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::fill(OVERLAY));
            }
        }
        for (i, (text, fg)) in lines.iter().enumerate() {
            if i + 1 >= box_h {
                break;
            }
            self.front.put_centered(box_x, box_w, box_y + 1 + i, text, *fg, OVERLAY);
        }
    }

    fn compose_title(&mut self, snap: &Snapshot, vp: &Viewport) {
        let high = format!("High Score: {}", snap.high_score);
        self.compose_box(vp, &[
            ("F L A P T E R M", TITLE),
            ("", Color::White),
            ("ENTER / SPACE: Play", ACTION),
            (high.as_str(), Color::White),
        ]);
    }

    fn compose_game_over(&mut self, snap: &Snapshot, vp: &Viewport) {
        let yours = format!("Your Score: {}", snap.score);
        // Same figure as `GameSession::best_score`, shown before the commit.
        let high = format!("High Score: {}", snap.high_score.max(snap.score));
        self.compose_box(vp, &[
            ("Game Over!", ALERT),
            ("", Color::White),
            (yours.as_str(), Color::White),
            (high.as_str(), TITLE),
            ("", Color::White),
            ("ENTER: Play Again", ACTION),
        ]);
    }
}

impl RenderSurface for Renderer {
    fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.render(snapshot)
    }
}
