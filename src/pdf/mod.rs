// src/pdf/mod.rs
//
// Exportação de um registo de tutoria para PDF (A4, paginação manual).
pub mod layout;
pub mod metrics;
pub mod signature;
mod writer;

use crate::{
    error::{AppError, AppResult},
    models::tutoria::Tutoria,
};
use chrono::{FixedOffset, NaiveDateTime, TimeZone};

// America/Sao_Paulo sem horário de verão
const LOCAL_OFFSET_SECS: i32 = -3 * 3600;

/// Data/hora UTC guardada na DB formatada na hora local da escola.
pub fn format_local(utc: NaiveDateTime) -> String {
    const FORMAT: &str = "%d/%m/%Y %H:%M";
    match FixedOffset::east_opt(LOCAL_OFFSET_SECS) {
        Some(offset) => offset.from_utc_datetime(&utc).format(FORMAT).to_string(),
        None => utc.format(FORMAT).to_string(),
    }
}

/// Gera o PDF de um registo. `owner_name` é o utilizador dono do registo.
pub fn render_tutoria(tutoria: &Tutoria, owner_name: &str) -> AppResult<Vec<u8>> {
    let layout = layout::layout_tutoria(tutoria, owner_name);
    let title = format!("Tutoria {} - {}", tutoria.id, tutoria.nome_aluno);
    writer::write_pdf(&title, &layout).map_err(|e| {
        tracing::error!("Falha ao gerar PDF da tutoria {}: {}", tutoria.id, e);
        AppError::InternalServerError
    })
}

/// Troca tudo o que não for ASCII alfanumérico, '.', '_' ou '-' por '_'.
pub fn sanitize_filename(raw: &str, fallback: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

pub fn pdf_filename(id: i64, nome_aluno: &str) -> String {
    let base = sanitize_filename(&format!("tutoria_{}_{}", id, nome_aluno.trim()), "tutoria");
    format!("{}.pdf", base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tutoria() -> Tutoria {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(2, 15, 0)
            .unwrap();
        Tutoria {
            id: 12,
            professor_id: 1,
            tutor_nome: Some("Prof. Rui".into()),
            nome_aluno: "José Antônio".into(),
            serie: "9B".into(),
            tel_aluno: Some("11 90000-0000".into()),
            tel_resp: None,
            contatos_extra: Some(r#"[{"nome":"Mãe","telefone":"11 9999-0000"}]"#.into()),
            projeto_vida: Some("Ser engenheiro.".into()),
            descricoes: Some("Conversa sobre rotina.\n\nCombinado acompanhamento.".into()),
            ocorrencias: Some("Pessoal,Aprendizagem".into()),
            assinatura: Some(signature::png_data_url(300, 80)),
            carimbo_resp: Some("Marta".into()),
            carimbo_inst: Some("EE Centro".into()),
            carimbo_contato: None,
            carimbo_texto: Some("ÊXITO VISTADO".into()),
            carimbo_obs: Some("Reavaliar em março.".into()),
            criado_em: ts,
            atualizado_em: ts,
        }
    }

    #[test]
    fn renders_pdf_bytes() {
        let bytes = render_tutoria(&tutoria(), "rui").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn renders_multi_page_pdf() {
        let mut t = tutoria();
        t.descricoes = Some("Linha de acompanhamento semanal.\n".repeat(200));
        let bytes = render_tutoria(&t, "rui").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn local_time_crosses_midnight() {
        let utc = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(2, 15, 0)
            .unwrap();
        assert_eq!(format_local(utc), "01/01/2025 23:15");
    }

    #[test]
    fn filenames_are_ascii_safe() {
        assert_eq!(pdf_filename(12, "José Antônio"), "tutoria_12_Jos__Ant_nio.pdf");
        assert_eq!(pdf_filename(3, "  "), "tutoria_3_.pdf");
        assert_eq!(sanitize_filename("", "tutoria"), "tutoria");
        assert_eq!(sanitize_filename("a/b\\c", "x"), "a_b_c");
    }
}
