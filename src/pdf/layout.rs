// src/pdf/layout.rs
//
// Paginação manual: o registo é convertido numa lista de operações de
// desenho por página. As coordenadas estão em pontos, com origem no canto
// inferior esquerdo (como no PDF). O cursor `y` desce a partir do topo.
use super::{
    format_local,
    metrics::{text_width, Font},
    signature::{decode_signature, fit_size, Signature},
};
use crate::models::tutoria::{Carimbo, Contato, Tutoria};
use image::{DynamicImage, GenericImageView};

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 16.0;
const LABEL_SIZE: f32 = 11.0;
const LABEL_HEIGHT: f32 = 16.0;
const BODY_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 14.0;
const PARAGRAPH_GAP: f32 = 6.0;
const SECTION_GAP: f32 = 12.0;
/// Espaço mínimo exigido além do rótulo e da primeira linha.
const FIELD_MIN_SPACE: f32 = 28.0;

const PHONE_COLUMN: f32 = CONTENT_WIDTH * 0.62;

pub const SIGNATURE_MAX_WIDTH: f32 = 220.0;
pub const SIGNATURE_MAX_HEIGHT: f32 = 160.0;

pub const STAMP_BASE_HEIGHT: f32 = 78.0;
pub const STAMP_OBS_EXTRA: f32 = 26.0;
const STAMP_PADDING: f32 = 12.0;
const STAMP_RADIUS: f32 = 8.0;
const STAMP_OBS_SIZE: f32 = 8.0;
const STAMP_OBS_LINES: usize = 2;

pub const SEM_CONTATOS: &str = "Nenhum contato extra informado.";
pub const SEM_OCORRENCIAS: &str = "Nenhuma ocorrência registrada.";
pub const SEM_ASSINATURA: &str = "Sem assinatura.";
pub const ASSINATURA_ILEGIVEL: &str = "Assinatura não disponível.";
pub const SEM_CARIMBO: &str = "Sem carimbo.";
pub const NAO_INFORMADO: &str = "Não informado.";

#[derive(Debug, Clone)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        text: String,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
    },
    RoundedRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: DynamicImage,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Documento já paginado, pronto para ser escrito em PDF.
#[derive(Debug, Clone)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| p.texts())
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

/// Linha de corpo já quebrada, com o espaço extra a deixar antes dela.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyLine {
    pub text: String,
    pub gap_before: f32,
}

// --- Quebra de texto ---

/// Parte uma palavra que sozinha não cabe na largura.
fn split_long_word(word: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    if text_width(word, font, size) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if text_width(&current, font, size) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Quebra gulosa: junta palavras enquanto a largura medida couber.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        for piece in split_long_word(word, font, size, max_width) {
            if current.is_empty() {
                current = piece;
                continue;
            }
            let candidate = format!("{} {}", current, piece);
            if text_width(&candidate, font, size) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, piece));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Quebra respeitando parágrafos: linha em branco separa parágrafos (com
/// espaço extra); quebra de linha simples força nova linha.
pub fn paragraph_lines(text: &str, font: Font, size: f32, max_width: f32) -> Vec<BodyLine> {
    let mut out = Vec::new();
    let mut pending_gap = false;
    for source_line in text.replace("\r\n", "\n").split('\n') {
        if source_line.trim().is_empty() {
            pending_gap = !out.is_empty();
            continue;
        }
        for (i, line) in wrap_text(source_line, font, size, max_width).into_iter().enumerate() {
            let gap_before = if i == 0 && pending_gap { PARAGRAPH_GAP } else { 0.0 };
            out.push(BodyLine { text: line, gap_before });
        }
        pending_gap = false;
    }
    out
}

/// Corta o texto com "..." para caber numa linha.
fn fit_line(text: &str, font: Font, size: f32, max_width: f32) -> String {
    if text_width(text, font, size) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        out.push(c);
        if text_width(&format!("{}...", out), font, size) > max_width {
            out.pop();
            break;
        }
    }
    format!("{}...", out.trim_end())
}

/// Pontos do contorno de um retângulo de cantos arredondados (sentido anti-horário,
/// a começar no canto inferior esquerdo).
pub fn rounded_rect_points(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Vec<(f32, f32)> {
    const STEPS: usize = 6;
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    let corners = [
        (x + r, y + r, 180.0_f32),
        (x + width - r, y + r, 270.0),
        (x + width - r, y + height - r, 0.0),
        (x + r, y + height - r, 90.0),
    ];
    let mut points = Vec::with_capacity(corners.len() * (STEPS + 1));
    for (cx, cy, start) in corners {
        for step in 0..=STEPS {
            let angle = (start + 90.0 * step as f32 / STEPS as f32).to_radians();
            points.push((cx + r * angle.cos(), cy + r * angle.sin()));
        }
    }
    points
}

// --- Cursor de página ---

struct Composer {
    pages: Vec<Page>,
    y: f32,
}

impl Composer {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn remaining(&self) -> f32 {
        self.y - MARGIN
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.remaining() < needed {
            self.new_page();
        }
    }

    fn text_at(&mut self, x: f32, baseline: f32, size: f32, font: Font, text: impl Into<String>) {
        self.push(DrawOp::Text {
            x,
            y: baseline,
            size,
            font,
            text: text.into(),
        });
    }

    /// Escreve uma linha no cursor e desce `height`.
    fn line_of_text(&mut self, x: f32, size: f32, font: Font, height: f32, text: impl Into<String>) {
        let baseline = self.y - size;
        self.text_at(x, baseline, size, font, text);
        self.y -= height;
    }

    fn rule(&mut self) {
        let y = self.y - 3.0;
        self.push(DrawOp::Line {
            x1: MARGIN,
            y1: y,
            x2: MARGIN + CONTENT_WIDTH,
            y2: y,
            thickness: 0.6,
        });
        self.y -= 7.0;
    }

    fn label(&mut self, label: &str) {
        self.line_of_text(MARGIN, LABEL_SIZE, Font::Bold, LABEL_HEIGHT, label);
    }

    /// Campo com rótulo e corpo quebrado. O rótulo nunca fica sozinho no
    /// fim de uma página.
    fn field(&mut self, label: &str, lines: &[BodyLine]) {
        let first = lines.first().map(|l| l.gap_before + LINE_HEIGHT).unwrap_or(0.0);
        self.ensure_space(LABEL_HEIGHT + first + FIELD_MIN_SPACE);
        self.label(label);
        for line in lines {
            self.y -= line.gap_before;
            self.ensure_space(LINE_HEIGHT);
            self.line_of_text(MARGIN, BODY_SIZE, Font::Regular, LINE_HEIGHT, line.text.clone());
        }
        self.y -= SECTION_GAP;
    }

    fn placeholder_field(&mut self, label: &str, placeholder: &str) {
        self.field(
            label,
            &[BodyLine {
                text: placeholder.to_string(),
                gap_before: 0.0,
            }],
        );
    }

    fn text_field(&mut self, label: &str, text: &str) {
        let lines = paragraph_lines(text, Font::Regular, BODY_SIZE, CONTENT_WIDTH);
        if lines.is_empty() {
            self.placeholder_field(label, NAO_INFORMADO);
        } else {
            self.field(label, &lines);
        }
    }

    /// "Rótulo: valor" numa linha (com quebra do valor se preciso).
    fn info_row(&mut self, label: &str, value: &str) {
        let label = format!("{}:", label);
        let value_x = MARGIN + text_width(&label, Font::Bold, BODY_SIZE) + 4.0;
        let value_width = MARGIN + CONTENT_WIDTH - value_x;
        let value = if value.trim().is_empty() { "-" } else { value.trim() };
        let lines = wrap_text(value, Font::Regular, BODY_SIZE, value_width);

        self.ensure_space(LINE_HEIGHT * lines.len().max(1) as f32);
        let baseline = self.y - BODY_SIZE;
        self.text_at(MARGIN, baseline, BODY_SIZE, Font::Bold, label);
        for line in lines {
            let baseline = self.y - BODY_SIZE;
            self.text_at(value_x, baseline, BODY_SIZE, Font::Regular, line);
            self.y -= LINE_HEIGHT;
        }
    }

    fn contacts(&mut self, contatos: &[Contato]) {
        const LABEL: &str = "Contatos extras";
        if contatos.is_empty() {
            self.placeholder_field(LABEL, SEM_CONTATOS);
            return;
        }

        let name_width = PHONE_COLUMN - 10.0;
        let phone_width = CONTENT_WIDTH - PHONE_COLUMN;
        let rows: Vec<(Vec<String>, Vec<String>)> = contatos
            .iter()
            .map(|c| {
                let nome = if c.nome.trim().is_empty() { "-" } else { c.nome.as_str() };
                let tel = if c.telefone.trim().is_empty() { "-" } else { c.telefone.as_str() };
                (
                    wrap_text(nome, Font::Regular, BODY_SIZE, name_width),
                    wrap_text(tel, Font::Regular, BODY_SIZE, phone_width),
                )
            })
            .collect();

        let header_height = LINE_HEIGHT + 7.0;
        let first_row = rows
            .first()
            .map(|(n, t)| n.len().max(t.len()) as f32 * LINE_HEIGHT)
            .unwrap_or(LINE_HEIGHT);
        self.ensure_space(LABEL_HEIGHT + header_height + first_row + FIELD_MIN_SPACE);
        self.label(LABEL);
        self.table_header();

        for (names, phones) in rows {
            let row_height = names.len().max(phones.len()).max(1) as f32 * LINE_HEIGHT;
            if self.remaining() < row_height {
                // Cabeçalho repetido na página nova
                self.new_page();
                self.table_header();
            }
            let top = self.y;
            for (i, name) in names.into_iter().enumerate() {
                let baseline = top - BODY_SIZE - i as f32 * LINE_HEIGHT;
                self.text_at(MARGIN, baseline, BODY_SIZE, Font::Regular, name);
            }
            for (i, phone) in phones.into_iter().enumerate() {
                let baseline = top - BODY_SIZE - i as f32 * LINE_HEIGHT;
                self.text_at(MARGIN + PHONE_COLUMN, baseline, BODY_SIZE, Font::Regular, phone);
            }
            self.y = top - row_height;
        }
        self.y -= SECTION_GAP;
    }

    fn table_header(&mut self) {
        let baseline = self.y - BODY_SIZE;
        self.text_at(MARGIN, baseline, BODY_SIZE, Font::Bold, "Nome");
        self.text_at(MARGIN + PHONE_COLUMN, baseline, BODY_SIZE, Font::Bold, "Telefone");
        self.y -= LINE_HEIGHT;
        self.rule();
    }

    fn tags(&mut self, tags: &[String]) {
        const LABEL: &str = "Ocorrências";
        if tags.is_empty() {
            self.placeholder_field(LABEL, SEM_OCORRENCIAS);
            return;
        }
        let bulleted = tags
            .iter()
            .map(|t| format!("• {}", t))
            .collect::<Vec<_>>()
            .join("   ");
        let lines = paragraph_lines(&bulleted, Font::Regular, BODY_SIZE, CONTENT_WIDTH);
        self.field(LABEL, &lines);
    }

    fn signature(&mut self, raw: &str) {
        const LABEL: &str = "Assinatura";
        let image = match decode_signature(raw) {
            Signature::Missing => {
                self.placeholder_field(LABEL, SEM_ASSINATURA);
                return;
            }
            Signature::Invalid => {
                self.placeholder_field(LABEL, ASSINATURA_ILEGIVEL);
                return;
            }
            Signature::Image(image) => image,
        };

        let (px_w, px_h) = image.dimensions();
        let (width, height) = fit_size(px_w, px_h, SIGNATURE_MAX_WIDTH, SIGNATURE_MAX_HEIGHT);
        self.ensure_space(LABEL_HEIGHT + height + 4.0);
        self.label(LABEL);
        let bottom = self.y - height;
        self.push(DrawOp::Image {
            x: MARGIN,
            y: bottom,
            width,
            height,
            image,
        });
        self.y = bottom - 4.0;
        self.y -= SECTION_GAP;
    }

    fn stamp(&mut self, carimbo: &Carimbo) {
        const LABEL: &str = "Carimbo da gestão";
        if carimbo.is_blank() {
            self.placeholder_field(LABEL, SEM_CARIMBO);
            return;
        }
        let carimbo = carimbo.normalized();

        // Altura decidida antes de desenhar o contorno
        let has_obs = !carimbo.obs.is_empty();
        let height = STAMP_BASE_HEIGHT + if has_obs { STAMP_OBS_EXTRA } else { 0.0 };
        self.ensure_space(LABEL_HEIGHT + height + 4.0);
        self.label(LABEL);

        let top = self.y - 2.0;
        let bottom = top - height;
        let left = MARGIN + STAMP_PADDING;
        let right = MARGIN + CONTENT_WIDTH - STAMP_PADDING;
        let half = (right - left) / 2.0 - 6.0;

        self.push(DrawOp::RoundedRect {
            x: MARGIN,
            y: bottom,
            width: CONTENT_WIDTH,
            height,
            radius: STAMP_RADIUS,
        });

        let headline = fit_line(carimbo.texto.trim(), Font::Bold, 13.0, right - left);
        self.text_at(left, top - 20.0, 13.0, Font::Bold, headline);

        let inst = fit_line(carimbo.inst.trim(), Font::Regular, 9.0, half);
        let contato = fit_line(carimbo.contato.trim(), Font::Regular, 9.0, half);
        self.text_at(left, top - 38.0, 9.0, Font::Regular, inst);
        self.text_at(left, top - 52.0, 9.0, Font::Regular, contato);

        if !carimbo.resp.trim().is_empty() {
            let label = "Responsável";
            let label_x = right - text_width(label, Font::Bold, 8.0);
            self.text_at(label_x, top - 38.0, 8.0, Font::Bold, label);
            let resp = fit_line(carimbo.resp.trim(), Font::Regular, 10.0, half);
            let resp_x = right - text_width(&resp, Font::Regular, 10.0);
            self.text_at(resp_x, top - 52.0, 10.0, Font::Regular, resp);
        }

        if has_obs {
            let mut lines = wrap_text(carimbo.obs.trim(), Font::Regular, STAMP_OBS_SIZE, right - left);
            if lines.len() > STAMP_OBS_LINES {
                lines.truncate(STAMP_OBS_LINES);
                if let Some(last) = lines.last_mut() {
                    *last = fit_line(&format!("{} ...", last), Font::Regular, STAMP_OBS_SIZE, right - left);
                }
            }
            for (i, line) in lines.into_iter().enumerate() {
                let baseline = top - 72.0 - i as f32 * 10.0;
                self.text_at(left, baseline, STAMP_OBS_SIZE, Font::Regular, line);
            }
        }

        self.y = bottom - SECTION_GAP;
    }

    fn finish(mut self) -> Layout {
        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            let text = format!("Página {} de {}", i + 1, total);
            let x = MARGIN + CONTENT_WIDTH - text_width(&text, Font::Regular, 8.0);
            page.ops.push(DrawOp::Text {
                x,
                y: MARGIN / 2.0,
                size: 8.0,
                font: Font::Regular,
                text,
            });
        }
        Layout { pages: self.pages }
    }
}

/// Monta o documento de um registo. Nunca falha: dados estragados viram
/// texto de substituição.
pub fn layout_tutoria(tutoria: &Tutoria, owner_name: &str) -> Layout {
    let mut c = Composer::new();

    c.line_of_text(MARGIN, TITLE_SIZE, Font::Bold, TITLE_SIZE + 6.0, "Registro de Tutoria");
    c.rule();

    let tutor = tutoria
        .tutor_nome
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(owner_name);
    c.info_row("Aluno", &tutoria.nome_aluno);
    c.info_row("Série", &tutoria.serie);
    c.info_row("Tutor", tutor);
    c.info_row("Professor", owner_name);
    c.info_row("Telefone do aluno", tutoria.tel_aluno.as_deref().unwrap_or(""));
    c.info_row("Telefone do responsável", tutoria.tel_resp.as_deref().unwrap_or(""));
    c.info_row("Criado em", &format_local(tutoria.criado_em));
    c.info_row("Atualizado em", &format_local(tutoria.atualizado_em));
    c.y -= SECTION_GAP;

    c.contacts(&tutoria.contatos());
    c.text_field("Projeto de vida", tutoria.projeto_vida.as_deref().unwrap_or(""));
    c.text_field("Descrições / Observações", tutoria.descricoes.as_deref().unwrap_or(""));
    c.tags(&tutoria.tags());
    c.signature(tutoria.assinatura());
    c.stamp(&tutoria.carimbo());

    c.finish()
}
