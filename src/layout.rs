//! Page composition.
//!
//! [`compose`] turns a normalized record into a [`PageLayout`]: an ordered
//! display list of drawing operations in top-down points on a US Letter page.
//! Two flows share the page, the sidebar on the left and the main content on
//! the right, and each keeps its own [`Cursor`]. Nothing here touches a PDF
//! object, so the whole layout can be inspected in tests.

use crate::font_metrics::{self, Weight, LINE_HEIGHT};
use crate::photo::Photo;
use crate::sanitize::{year_range, NormalizedRecord};
use crate::theme::{Color, ResolvedStyle, Tones};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const PAGE_WIDTH: f32 = 612.0; // US Letter width in points
pub const PAGE_HEIGHT: f32 = 792.0; // US Letter height in points

pub const SIDEBAR_WIDTH: f32 = 170.0;
const SIDEBAR_X: f32 = 20.0;
const SIDEBAR_TEXT_WIDTH: f32 = SIDEBAR_WIDTH - 40.0;
const SIDEBAR_SIZE: f32 = 10.0;

pub const CONTENT_X: f32 = SIDEBAR_WIDTH + 24.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - CONTENT_X - 48.0;
const CONTENT_TOP: f32 = 64.0;
/// Width kept free on the right of a dated row for the year range.
const DATE_GUTTER: f32 = 120.0;

const BORDER_INSET: f32 = 40.0;

const PHOTO_SIZE: f32 = 110.0;
const PHOTO_Y: f32 = 58.0;
const PHOTO_RING_GAP: f32 = 6.0;
const SIDEBAR_START_WITH_PHOTO: f32 = PHOTO_Y + PHOTO_SIZE + 22.0;
const SIDEBAR_START: f32 = 140.0;
const SIDEBAR_MIN_Y: f32 = 160.0;

const PILL_HEIGHT: f32 = 24.0;
const PILL_RADIUS: f32 = 12.0;
const PILL_ADVANCE: f32 = 34.0;

const MAX_SIDEBAR_EDUCATION: usize = 3;
const MAX_SIDEBAR_SKILLS: usize = 12;
const MAX_SIDEBAR_HOBBIES: usize = 8;

// ============================================================================
// DISPLAY LIST
// ============================================================================

/// Which flow an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Page,
    Sidebar,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// A block of already-wrapped text. `y` is the top of the first line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub lines: Vec<String>,
    pub size: f32,
    pub weight: Weight,
    pub color: Color,
    pub align: Align,
}

impl TextRun {
    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * LINE_HEIGHT * self.size
    }

    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

#[derive(Debug, Clone)]
pub enum DrawOp {
    FillRect { x: f32, y: f32, w: f32, h: f32, color: Color },
    StrokeRect { x: f32, y: f32, w: f32, h: f32, color: Color, line_width: f32 },
    FillRoundedRect { x: f32, y: f32, w: f32, h: f32, radius: f32, color: Color },
    FillCircle { cx: f32, cy: f32, r: f32, color: Color },
    StrokeCircle { cx: f32, cy: f32, r: f32, color: Color, line_width: f32 },
    Line { x1: f32, y1: f32, x2: f32, y2: f32, color: Color, line_width: f32 },
    Text(TextRun),
    /// Square photo, cover-cropped and clipped to the inscribed circle.
    Photo { x: f32, y: f32, size: f32, photo: Photo },
}

impl DrawOp {
    /// Top edge of the operation's bounding box.
    pub fn top(&self) -> f32 {
        match self {
            DrawOp::FillRect { y, .. }
            | DrawOp::StrokeRect { y, .. }
            | DrawOp::FillRoundedRect { y, .. }
            | DrawOp::Photo { y, .. } => *y,
            DrawOp::FillCircle { cy, r, .. } | DrawOp::StrokeCircle { cy, r, .. } => cy - r,
            DrawOp::Line { y1, y2, .. } => y1.min(*y2),
            DrawOp::Text(run) => run.y,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Placed {
    pub region: Region,
    pub op: DrawOp,
}

/// A composed page, in painting order.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<Placed>,
}

impl PageLayout {
    pub fn ops_in(&self, region: Region) -> impl Iterator<Item = &DrawOp> + '_ {
        self.ops
            .iter()
            .filter(move |placed| placed.region == region)
            .map(|placed| &placed.op)
    }

    pub fn texts_in(&self, region: Region) -> impl Iterator<Item = &TextRun> + '_ {
        self.ops_in(region).filter_map(|op| match op {
            DrawOp::Text(run) => Some(run),
            _ => None,
        })
    }

    /// First text run in `region` whose joined lines contain `needle`.
    pub fn find_text(&self, region: Region, needle: &str) -> Option<&TextRun> {
        self.texts_in(region).find(|run| run.text().contains(needle))
    }
}

// ============================================================================
// CURSOR
// ============================================================================

/// Write position inside one flow. Only ever moves down.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

impl Cursor {
    pub fn new(x: f32, y: f32, width: f32) -> Self {
        Cursor { x, y, width }
    }

    /// Advance by `lines` line heights of text at `size`.
    pub fn move_down(&mut self, lines: f32, size: f32) {
        self.y += lines * LINE_HEIGHT * size;
    }

    pub fn advance(&mut self, by: f32) {
        self.y += by.max(0.0);
    }
}

// ============================================================================
// COMPOSER
// ============================================================================

struct Composer {
    ops: Vec<Placed>,
    tones: Tones,
}

/// Style of a text block, without its position.
#[derive(Clone, Copy)]
struct Font {
    size: f32,
    weight: Weight,
    color: Color,
    align: Align,
}

impl Font {
    fn regular(size: f32, color: Color) -> Self {
        Font { size, weight: Weight::Regular, color, align: Align::Left }
    }

    fn bold(size: f32, color: Color) -> Self {
        Font { size, weight: Weight::Bold, color, align: Align::Left }
    }

    fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

impl Composer {
    fn push(&mut self, region: Region, op: DrawOp) {
        self.ops.push(Placed { region, op });
    }

    /// Places wrapped text with its top at (x, y); returns the block height.
    fn text_at(&mut self, region: Region, x: f32, y: f32, width: f32, text: &str, font: Font) -> f32 {
        let lines = font_metrics::get_metrics(font.weight).wrap(text, font.size, width);
        let run = TextRun {
            x,
            y,
            width,
            lines,
            size: font.size,
            weight: font.weight,
            color: font.color,
            align: font.align,
        };
        let height = run.height();
        self.push(region, DrawOp::Text(run));
        height
    }

    /// Places text at the cursor and moves the cursor below it.
    fn flow(&mut self, region: Region, cursor: &mut Cursor, text: &str, font: Font) {
        let height = self.text_at(region, cursor.x, cursor.y, cursor.width, text, font);
        cursor.advance(height);
    }

    // ------------------------------------------------------------------
    // Page
    // ------------------------------------------------------------------

    fn page(&mut self) {
        if let Some(fill) = self.tones.page_fill {
            self.push(
                Region::Page,
                DrawOp::FillRect { x: 0.0, y: 0.0, w: PAGE_WIDTH, h: PAGE_HEIGHT, color: fill },
            );
        }
        self.push(
            Region::Page,
            DrawOp::StrokeRect {
                x: BORDER_INSET,
                y: BORDER_INSET,
                w: PAGE_WIDTH - 2.0 * BORDER_INSET,
                h: PAGE_HEIGHT - 2.0 * BORDER_INSET,
                color: self.tones.accent,
                line_width: 2.0,
            },
        );
    }

    // ------------------------------------------------------------------
    // Content column
    // ------------------------------------------------------------------

    fn content(&mut self, cv: &NormalizedRecord) {
        let region = Region::Content;
        let tones = self.tones;
        let mut cur = Cursor::new(CONTENT_X, CONTENT_TOP - 12.0, CONTENT_WIDTH);

        self.flow(region, &mut cur, "Curriculum Vitae", Font::regular(20.0, tones.primary).aligned(Align::Center));
        cur.move_down(0.2, 20.0);

        let mut header = Cursor::new(cur.x, cur.y, CONTENT_WIDTH * 0.7);
        self.flow(region, &mut header, &cv.full_name(), Font::regular(28.0, tones.text));
        if !cv.job_title.is_empty() {
            self.flow(region, &mut header, &cv.job_title, Font::regular(14.0, tones.muted));
        }
        cur.y = header.y;
        cur.move_down(0.6, 14.0);

        // Identity block
        cur.advance(8.0);
        let body = Font::regular(12.0, tones.text);
        self.flow(region, &mut cur, &format!("Nom : {}", cv.last_name), body);
        self.flow(region, &mut cur, &format!("Prénom : {}", cv.first_name), body);
        if !cv.job_title.is_empty() {
            self.flow(region, &mut cur, &format!("Intitulé : {}", cv.job_title), body);
        }
        self.flow(region, &mut cur, &format!("Email : {}", cv.email), body);
        self.flow(region, &mut cur, &format!("Téléphone : {}", cv.phone), body);
        cur.move_down(1.0, 12.0);

        if !cv.summary.is_empty() {
            self.heading(&mut cur, "Profil");
            self.paragraph(&mut cur, &cv.summary);
        }
        if !cv.skills.is_empty() {
            self.heading(&mut cur, "Compétences :");
            self.paragraph(&mut cur, &cv.skills.join(", "));
        }

        if !cv.experience.is_empty() {
            self.section_title(&mut cur, "Expérience professionnelle");
            for exp in &cv.experience {
                let left = joined_with_dash(&exp.role, &exp.company);
                self.dated_row(&mut cur, &left, &year_range(exp.start, exp.end));
                if !exp.description.is_empty() {
                    cur.move_down(0.2, 10.0);
                    self.flow(region, &mut cur, &exp.description, Font::regular(11.0, tones.text));
                }
                cur.move_down(0.8, 10.0);
            }
        }

        if !cv.education.is_empty() {
            self.section_title(&mut cur, "Éducation");
            for ed in &cv.education {
                let left = joined_with_dash(&ed.degree, &ed.school);
                self.dated_row(&mut cur, &left, &year_range(ed.start, ed.end));
                cur.move_down(0.5, 10.0);
            }
            cur.move_down(1.0, 10.0);
        }

        if !cv.languages.is_empty() {
            self.heading(&mut cur, "Langues :");
            self.paragraph(&mut cur, &cv.languages.join(", "));
        }

        if !cv.projects.is_empty() {
            self.section_title(&mut cur, "Projets");
            for project in &cv.projects {
                self.flow(region, &mut cur, or_default(&project.title, "Projet"), body);
                if !project.description.is_empty() {
                    self.flow(region, &mut cur, &project.description, body);
                }
                if !project.technologies.is_empty() {
                    self.flow(region, &mut cur, &format!("Tech: {}", project.technologies.join(", ")), body);
                }
                if !project.link.is_empty() {
                    self.flow(region, &mut cur, &format!("Lien: {}", project.link), body);
                }
                cur.move_down(0.5, 12.0);
            }
            cur.move_down(1.0, 12.0);
        }

        if !cv.certifications.is_empty() {
            self.section_title(&mut cur, "Certifications");
            for cert in &cv.certifications {
                self.flow(region, &mut cur, or_default(&cert.name, "Certification"), body);
                if !cert.organization.is_empty() {
                    self.flow(region, &mut cur, &format!("Organisme: {}", cert.organization), body);
                }
                if let Some(date) = cert.date {
                    self.flow(region, &mut cur, &date.format("%d/%m/%Y").to_string(), body);
                }
                cur.move_down(0.5, 12.0);
            }
            cur.move_down(1.0, 12.0);
        }

        if !cv.hobbies.is_empty() {
            self.section_title(&mut cur, "Centres d'intérêt");
            for hobby in &cv.hobbies {
                self.flow(region, &mut cur, &format!("• {}", hobby), body);
            }
            cur.move_down(1.0, 12.0);
        }

        cur.move_down(1.0, 10.0);
        self.flow(region, &mut cur, "Généré automatiquement", Font::regular(10.0, tones.text).aligned(Align::Center));
    }

    /// Underlined heading in the primary color.
    fn heading(&mut self, cur: &mut Cursor, label: &str) {
        let size = 14.0;
        let top = cur.y;
        self.flow(Region::Content, cur, label, Font::regular(size, self.tones.primary));

        let width = font_metrics::get_metrics(Weight::Regular)
            .string_width(label, size)
            .min(cur.width);
        let y = top + size;
        self.push(
            Region::Content,
            DrawOp::Line {
                x1: cur.x,
                y1: y,
                x2: cur.x + width,
                y2: y,
                color: self.tones.primary,
                line_width: 0.7,
            },
        );
    }

    fn paragraph(&mut self, cur: &mut Cursor, text: &str) {
        self.flow(Region::Content, cur, text, Font::regular(12.0, self.tones.text));
        cur.move_down(1.0, 12.0);
    }

    /// Bold upper-cased label followed by a thin rule to the column edge.
    fn section_title(&mut self, cur: &mut Cursor, label: &str) {
        let size = 12.0;
        let label = label.to_uppercase();
        cur.advance(6.0);
        self.flow(Region::Content, cur, &label, Font::bold(size, self.tones.text));

        let label_width = font_metrics::get_metrics(Weight::Bold).string_width(&label, size);
        let x1 = (cur.x + label_width + 8.0).min(cur.x + cur.width);
        let y = cur.y + 2.0;
        self.push(
            Region::Content,
            DrawOp::Line {
                x1,
                y1: y,
                x2: cur.x + cur.width,
                y2: y,
                color: self.tones.rule,
                line_width: 1.0,
            },
        );
        cur.move_down(0.8, size);
    }

    /// Left text plus a right-aligned year range sharing the same top.
    fn dated_row(&mut self, cur: &mut Cursor, left: &str, dates: &str) {
        let top = cur.y;
        let left_height = self.text_at(
            Region::Content,
            cur.x,
            top,
            cur.width - DATE_GUTTER,
            left,
            Font::regular(12.0, self.tones.text),
        );
        let date_height = self.text_at(
            Region::Content,
            cur.x,
            top,
            cur.width,
            dates,
            Font::regular(10.0, self.tones.muted).aligned(Align::Right),
        );
        cur.advance(left_height.max(date_height));
    }

    // ------------------------------------------------------------------
    // Sidebar
    // ------------------------------------------------------------------

    fn sidebar(&mut self, cv: &NormalizedRecord, photo: Option<&Photo>) {
        let region = Region::Sidebar;
        let tones = self.tones;

        self.push(
            region,
            DrawOp::FillRect { x: 0.0, y: 0.0, w: SIDEBAR_WIDTH, h: PAGE_HEIGHT, color: tones.sidebar_fill },
        );

        let photo_bottom = match photo {
            Some(photo) => {
                let x = (SIDEBAR_WIDTH - PHOTO_SIZE) / 2.0;
                let radius = PHOTO_SIZE / 2.0;
                self.push(
                    region,
                    DrawOp::StrokeCircle {
                        cx: x + radius,
                        cy: PHOTO_Y + radius,
                        r: radius + PHOTO_RING_GAP,
                        color: tones.primary,
                        line_width: 3.0,
                    },
                );
                self.push(region, DrawOp::Photo { x, y: PHOTO_Y, size: PHOTO_SIZE, photo: photo.clone() });
                SIDEBAR_START_WITH_PHOTO
            }
            None => SIDEBAR_START,
        };

        let body = Font::regular(SIDEBAR_SIZE, tones.sidebar_text);
        let mut cur = Cursor::new(SIDEBAR_X, photo_bottom.max(SIDEBAR_MIN_Y), SIDEBAR_TEXT_WIDTH);

        self.pill(&mut cur, "CONTACT");
        let location = [cv.city.as_str(), cv.country.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        let contact = [
            cv.phone.as_str().to_string(),
            cv.email.as_str().to_string(),
            cv.address.clone(),
            location,
            labelled("LinkedIn", &cv.linkedin),
            labelled("GitHub", &cv.github),
            or_default(&cv.website, &cv.portfolio).to_string(),
        ];
        for line in contact.iter().filter(|line| !line.is_empty()) {
            self.flow(region, &mut cur, line, body);
            cur.advance(6.0);
        }

        if !cv.education.is_empty() {
            cur.advance(12.0);
            self.pill(&mut cur, "ÉDUCATION");
            for ed in cv.education.iter().take(MAX_SIDEBAR_EDUCATION) {
                self.flow(region, &mut cur, &ed.degree, Font::bold(SIDEBAR_SIZE, tones.sidebar_text));
                if !ed.school.is_empty() {
                    self.flow(region, &mut cur, &ed.school, body);
                }
                let dates = year_range(ed.start, ed.end);
                if dates.trim() != "-" {
                    self.flow(region, &mut cur, &dates, body);
                }
                cur.advance(6.0);
            }
        }

        if !cv.skills.is_empty() {
            cur.advance(12.0);
            self.pill(&mut cur, "COMPÉTENCES");
            for skill in cv.skills.iter().take(MAX_SIDEBAR_SKILLS) {
                self.bullet(&mut cur, skill);
            }
        }

        if !cv.hobbies.is_empty() {
            cur.advance(12.0);
            self.pill(&mut cur, "CENTRES D'INTÉRÊT");
            for hobby in cv.hobbies.iter().take(MAX_SIDEBAR_HOBBIES) {
                self.bullet(&mut cur, hobby);
            }
        }
    }

    /// Accent-filled rounded label spanning the sidebar column.
    fn pill(&mut self, cur: &mut Cursor, label: &str) {
        let tones = self.tones;
        self.push(
            Region::Sidebar,
            DrawOp::FillRoundedRect {
                x: cur.x,
                y: cur.y,
                w: cur.width,
                h: PILL_HEIGHT,
                radius: PILL_RADIUS,
                color: tones.accent,
            },
        );
        self.text_at(
            Region::Sidebar,
            cur.x,
            cur.y + 6.0,
            cur.width,
            label,
            Font::bold(11.0, tones.pill_text).aligned(Align::Center),
        );
        cur.advance(PILL_ADVANCE);
    }

    /// Sidebar list entry: indented text with a small dot beside its first line.
    fn bullet(&mut self, cur: &mut Cursor, text: &str) {
        let tones = self.tones;
        let top = cur.y;
        let height = self.text_at(
            Region::Sidebar,
            cur.x + 12.0,
            top,
            cur.width - 12.0,
            text,
            Font::regular(SIDEBAR_SIZE, tones.sidebar_text),
        );
        self.push(
            Region::Sidebar,
            DrawOp::FillCircle { cx: cur.x + 3.0, cy: top + 6.0, r: 2.0, color: tones.primary },
        );
        cur.advance(height + 4.0);
    }
}

fn joined_with_dash(left: &str, right: &str) -> String {
    if right.is_empty() {
        left.to_string()
    } else {
        format!("{} — {}", left, right)
    }
}

fn labelled(label: &str, value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("{}: {}", label, value)
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Lays out one page for `cv`. Pure: the same inputs give the same list.
pub fn compose(cv: &NormalizedRecord, style: &ResolvedStyle, photo: Option<&Photo>) -> PageLayout {
    let mut composer = Composer { ops: Vec::new(), tones: style.tones() };

    composer.page();
    composer.sidebar(cv, photo);
    composer.content(cv);

    PageLayout { width: PAGE_WIDTH, height: PAGE_HEIGHT, ops: composer.ops }
}
