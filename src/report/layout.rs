// src/report/layout.rs
//! Positioned text for a PDF page and the grids rebuilt from it.
//!
//! The page's content stream is replayed through the text operators so every
//! shown string lands at a user-space position. Runs on the same baseline
//! form a line; a horizontal gap wider than about one em starts a new cell;
//! a vertical gap of more than two line heights ends a table.

use lopdf::{content::Content, Object};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::table::{RawGrid, Row};

/// Average glyph advance in text space, as a fraction of the font size.
/// Widths of the standard fonts sit between 0.45 and 0.6.
const GLYPH_WIDTH: f64 = 0.5;
/// Horizontal gap (in ems) that separates two cells.
const CELL_GAP_EMS: f64 = 1.0;
/// Horizontal gap (in ems) that turns into a space inside one cell.
const WORD_GAP_EMS: f64 = 0.2;
/// Baseline distance (in ems) beyond which a new table starts.
const TABLE_BREAK_EMS: f64 = 2.0;

/// Literal runs of spaces inside one string still split cells, as
/// fixed-pitch reports pad their columns that way.
static CELL_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t|\s{2,}").unwrap());

/// One shown string in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    /// Estimated x where the string ends.
    pub end: f64,
    /// Font size in user space.
    pub size: f64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f64, ty: f64) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self` applied first, then `other`.
    fn then(self, other: Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn origin(self) -> (f64, f64) {
        (self.0[4], self.0[5])
    }

    fn vertical_scale(self) -> f64 {
        self.0[2].hypot(self.0[3])
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    if operands.len() < N {
        return None;
    }
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(out)
}

/// Simple-font bytes are read as Latin-1; a UTF-16BE BOM switches to UTF-16.
fn decode(bytes: &[u8]) -> String {
    if let [0xfe, 0xff, rest @ ..] = bytes {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|p| u16::from_be_bytes([p[0], p[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Text state carried between operators.
struct TextState {
    ctm: Matrix,
    saved: Vec<Matrix>,
    tm: Matrix,
    lm: Matrix,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    h_scale: f64,
    leading: f64,
    runs: Vec<TextRun>,
}

impl TextState {
    fn new() -> Self {
        TextState {
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            tm: Matrix::IDENTITY,
            lm: Matrix::IDENTITY,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            runs: Vec::new(),
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.lm = Matrix::translate(tx, ty).then(self.lm);
        self.tm = self.lm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn advance(&mut self, tx: f64) {
        self.tm = Matrix::translate(tx, 0.0).then(self.tm);
    }

    fn show(&mut self, bytes: &[u8]) {
        let text = decode(bytes);
        let start = self.tm.then(self.ctm);
        let glyphs = text.chars().count() as f64;
        let spaces = text.chars().filter(|&c| c == ' ').count() as f64;
        let width = (glyphs * (GLYPH_WIDTH * self.font_size + self.char_spacing)
            + spaces * self.word_spacing)
            * self.h_scale;
        self.advance(width);
        let end = self.tm.then(self.ctm);

        if text.trim().is_empty() {
            return;
        }
        let (x, y) = start.origin();
        self.runs.push(TextRun {
            x,
            y,
            end: end.origin().0,
            size: (self.font_size * start.vertical_scale()).abs(),
            text,
        });
    }

    fn show_array(&mut self, items: &[Object]) {
        for item in items {
            match item {
                Object::String(bytes, _) => self.show(bytes),
                other => {
                    if let Some(n) = number(other) {
                        self.advance(-n / 1000.0 * self.font_size * self.h_scale);
                    }
                }
            }
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(m) = self.saved.pop() {
                    self.ctm = m;
                }
            }
            "cm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.ctm = Matrix(m).then(self.ctm);
                }
            }
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.lm = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(number) {
                    self.font_size = size;
                }
            }
            "Tc" => self.char_spacing = operands.first().and_then(number).unwrap_or(0.0),
            "Tw" => self.word_spacing = operands.first().and_then(number).unwrap_or(0.0),
            "Tz" => self.h_scale = operands.first().and_then(number).unwrap_or(100.0) / 100.0,
            "TL" => self.leading = operands.first().and_then(number).unwrap_or(0.0),
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.lm = Matrix(m);
                    self.tm = self.lm;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                if let Some([aw, ac]) = numbers::<2>(operands) {
                    self.word_spacing = aw;
                    self.char_spacing = ac;
                }
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    self.show_array(items);
                }
            }
            _ => {}
        }
    }
}

/// Every non-blank string the content stream shows, in stream order.
pub fn text_runs(content: &Content) -> Vec<TextRun> {
    let mut state = TextState::new();
    for op in &content.operations {
        state.apply(&op.operator, &op.operands);
    }
    state.runs
}

/// Runs sharing a baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub y: f64,
    pub size: f64,
    pub runs: Vec<TextRun>,
}

/// Group runs into lines, top of the page first.
pub fn group_lines(mut runs: Vec<TextRun>) -> Vec<Line> {
    runs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));
    let mut lines: Vec<Line> = Vec::new();
    for run in runs {
        match lines.last_mut() {
            Some(line) if (line.y - run.y).abs() <= line.size.max(run.size).max(1.0) * 0.5 => {
                line.size = line.size.max(run.size);
                line.runs.push(run);
            }
            _ => lines.push(Line {
                y: run.y,
                size: run.size,
                runs: vec![run],
            }),
        }
    }
    for line in &mut lines {
        line.runs.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}

impl Line {
    /// Split the line into cells on wide horizontal gaps.
    pub fn cells(&self) -> Row {
        let em = self.size.max(1.0);
        let mut merged: Vec<String> = Vec::new();
        let mut cell_end = f64::NEG_INFINITY;
        for run in &self.runs {
            let gap = run.x - cell_end;
            match merged.last_mut() {
                Some(cell) if gap <= CELL_GAP_EMS * em => {
                    if gap > WORD_GAP_EMS * em && !cell.ends_with(' ') {
                        cell.push(' ');
                    }
                    cell.push_str(&run.text);
                    cell_end = cell_end.max(run.end);
                }
                _ => {
                    merged.push(run.text.clone());
                    cell_end = run.end;
                }
            }
        }
        merged
            .iter()
            .flat_map(|cell| CELL_GAP.split(cell.trim()))
            .map(|c| {
                let c = c.trim();
                (!c.is_empty()).then(|| c.to_string())
            })
            .collect()
    }

    pub fn text(&self) -> String {
        self.cells().into_iter().flatten().collect::<Vec<_>>().join("  ")
    }
}

/// Blocks of lines with no oversized vertical gap between them.
pub fn group_tables(lines: &[Line]) -> Vec<RawGrid> {
    let mut tables: Vec<RawGrid> = Vec::new();
    let mut current: RawGrid = Vec::new();
    let mut previous: Option<&Line> = None;
    for line in lines {
        if let Some(prev) = previous {
            let em = prev.size.max(line.size).max(1.0);
            if prev.y - line.y > TABLE_BREAK_EMS * em && !current.is_empty() {
                tables.push(std::mem::take(&mut current));
            }
        }
        let row = line.cells();
        if !row.is_empty() {
            current.push(row);
        }
        previous = Some(line);
    }
    if !current.is_empty() {
        tables.push(current);
    }
    tables
}
