// src/templates.rs
use crate::{
    context::RequestContext,
    models::tutoria::{
        serialize_contatos, FormRecord, Tutoria, TutoriaDraft, CARIMBO_TEXTO_PADRAO,
        OCORRENCIAS, SERIES,
    },
    pdf::format_local,
};
use askama::Template;
use std::collections::HashMap;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
    pub info: Option<String>,
    pub username: String,
}

#[derive(Template)]
#[template(path = "cadastro.html")]
pub struct CadastroPage {
    pub error: Option<String>,
    pub username: String,
}

#[derive(Template)]
#[template(path = "gestao_pin.html")]
pub struct GestaoPinPage {
    pub username: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "gestao.html")]
pub struct GestaoPage {
    pub username: String,
    pub texto_padrao: &'static str,
    pub confirmacao: &'static str,
}

// Opção de <select>/checkbox já marcada, para o template não comparar strings
#[derive(Debug, Clone)]
pub struct FormOption {
    pub value: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "form.html")]
pub struct FormPage {
    pub username: String,
    pub is_gestao: bool,
    /// Registo a editar; `None` para novo ou rascunho de duplicação.
    pub record_id: Option<i64>,
    pub is_draft: bool,
    pub tutor_nome: String,
    pub nome_aluno: String,
    pub serie_livre: Option<String>,
    pub tel_aluno: String,
    pub tel_resp: String,
    pub projeto_vida: String,
    pub descricoes: String,
    pub assinatura: String,
    pub contatos_json: String,
    pub series: Vec<FormOption>,
    pub ocorrencias: Vec<FormOption>,
}

impl FormPage {
    pub fn new(ctx: &RequestContext, record: FormRecord) -> Self {
        let (record_id, is_draft, draft) = match record {
            FormRecord::Nova => (None, false, None),
            FormRecord::Existing(t) => (Some(t.id), false, Some(t.to_draft())),
            FormRecord::Draft(d) => (None, true, Some(d)),
        };
        let draft = draft.unwrap_or_else(|| TutoriaDraft {
            tutor_nome: ctx.username.clone(),
            nome_aluno: String::new(),
            serie: String::new(),
            tel_aluno: String::new(),
            tel_resp: String::new(),
            contatos: Vec::new(),
            projeto_vida: String::new(),
            descricoes: String::new(),
            ocorrencias: Vec::new(),
            assinatura: String::new(),
        });

        let series = SERIES
            .iter()
            .copied()
            .map(|s| FormOption {
                value: s,
                selected: s == draft.serie,
            })
            .collect();
        // Série antiga fora da lista continua visível
        let serie_livre = if draft.serie.is_empty() || SERIES.contains(&draft.serie.as_str()) {
            None
        } else {
            Some(draft.serie.clone())
        };
        let ocorrencias = OCORRENCIAS
            .iter()
            .copied()
            .map(|o| FormOption {
                value: o,
                selected: draft.ocorrencias.iter().any(|t| t == o),
            })
            .collect();

        Self {
            username: ctx.username.clone(),
            is_gestao: ctx.is_gestao(),
            record_id,
            is_draft,
            tutor_nome: draft.tutor_nome,
            nome_aluno: draft.nome_aluno,
            serie_livre,
            tel_aluno: draft.tel_aluno,
            tel_resp: draft.tel_resp,
            projeto_vida: draft.projeto_vida,
            descricoes: draft.descricoes,
            assinatura: draft.assinatura,
            contatos_json: serialize_contatos(&draft.contatos),
            series,
            ocorrencias,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListaRow {
    pub id: i64,
    pub nome_aluno: String,
    pub serie: String,
    pub professor: String,
    pub ocorrencias: String,
    pub carimbado: bool,
    pub criado_em: String,
    pub atualizado_em: String,
}

#[derive(Template)]
#[template(path = "lista.html")]
pub struct ListaPage {
    pub username: String,
    pub is_gestao: bool,
    pub rows: Vec<ListaRow>,
}

impl ListaPage {
    pub fn new(ctx: &RequestContext, tutorias: &[Tutoria], owners: &HashMap<i64, String>) -> Self {
        let rows = tutorias
            .iter()
            .map(|t| ListaRow {
                id: t.id,
                nome_aluno: t.nome_aluno.clone(),
                serie: t.serie.clone(),
                professor: owners
                    .get(&t.professor_id)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", t.professor_id)),
                ocorrencias: t.tags().join(", "),
                carimbado: !t.carimbo().is_blank(),
                criado_em: format_local(t.criado_em),
                atualizado_em: format_local(t.atualizado_em),
            })
            .collect();
        Self {
            username: ctx.username.clone(),
            is_gestao: ctx.is_gestao(),
            rows,
        }
    }
}

impl GestaoPage {
    pub fn new(ctx: &RequestContext) -> Self {
        Self {
            username: ctx.username.clone(),
            texto_padrao: CARIMBO_TEXTO_PADRAO,
            confirmacao: crate::services::gestao_service::CONFIRMACAO_APAGAR_TODAS,
        }
    }
}
