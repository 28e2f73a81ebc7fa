// src/models/tutoria.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Turmas aceites no formulário.
pub const SERIES: &[&str] = &[
    "6A", "6B", "6C", "6D", "7A", "7B", "7C", "7D", "8A", "8B", "8C", "8D", "9A", "9B", "9C",
    "9D", "1EM-A", "1EM-B", "1EM-C", "2EM-A", "2TEC", "3EM-A", "3EM-B",
];

/// Vocabulário das ocorrências. Nenhum valor pode conter vírgula
/// (a coluna guarda a lista separada por vírgulas).
pub const OCORRENCIAS: &[&str] = &[
    "Pessoal",
    "Familia",
    "Saude",
    "Aprendizagem",
    "Comportamento",
    "Frequencia",
    "Convivencia",
    "Outros",
];

pub const CARIMBO_TEXTO_PADRAO: &str = "ÊXITO VISTADO";

// Representa uma linha da tabela 'tutorias'
#[derive(Debug, Clone, FromRow)]
pub struct Tutoria {
    pub id: i64,
    pub professor_id: i64,
    pub tutor_nome: Option<String>,
    pub nome_aluno: String,
    pub serie: String,
    pub tel_aluno: Option<String>,
    pub tel_resp: Option<String>,
    pub contatos_extra: Option<String>, // JSON: [{"nome": .., "telefone": ..}]
    pub projeto_vida: Option<String>,
    pub descricoes: Option<String>,
    pub ocorrencias: Option<String>, // "Pessoal,Familia"
    pub assinatura: Option<String>,  // data URL, vazio = sem assinatura
    pub carimbo_resp: Option<String>,
    pub carimbo_inst: Option<String>,
    pub carimbo_contato: Option<String>,
    pub carimbo_texto: Option<String>,
    pub carimbo_obs: Option<String>,
    pub criado_em: NaiveDateTime,
    pub atualizado_em: NaiveDateTime,
}

impl Tutoria {
    pub fn contatos(&self) -> Vec<Contato> {
        parse_contatos(self.contatos_extra.as_deref())
    }

    pub fn tags(&self) -> Vec<String> {
        split_tags(self.ocorrencias.as_deref())
    }

    pub fn assinatura(&self) -> &str {
        self.assinatura.as_deref().unwrap_or("")
    }

    pub fn carimbo(&self) -> Carimbo {
        Carimbo {
            resp: text_or_empty(&self.carimbo_resp),
            inst: text_or_empty(&self.carimbo_inst),
            contato: text_or_empty(&self.carimbo_contato),
            texto: text_or_empty(&self.carimbo_texto),
            obs: text_or_empty(&self.carimbo_obs),
        }
    }

    /// Campos que passam para um rascunho de duplicação (inclui a assinatura).
    pub fn to_draft(&self) -> TutoriaDraft {
        TutoriaDraft {
            tutor_nome: text_or_empty(&self.tutor_nome),
            nome_aluno: self.nome_aluno.clone(),
            serie: self.serie.clone(),
            tel_aluno: text_or_empty(&self.tel_aluno),
            tel_resp: text_or_empty(&self.tel_resp),
            contatos: self.contatos(),
            projeto_vida: text_or_empty(&self.projeto_vida),
            descricoes: text_or_empty(&self.descricoes),
            ocorrencias: self.tags(),
            assinatura: self.assinatura().to_string(),
        }
    }
}

fn text_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Contacto extra (nome + telefone).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contato {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub telefone: String,
}

/// Sub-registo do carimbo de gestão.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carimbo {
    #[serde(default)]
    pub resp: String,
    #[serde(default)]
    pub inst: String,
    #[serde(default)]
    pub contato: String,
    #[serde(default)]
    pub texto: String,
    #[serde(default)]
    pub obs: String,
}

impl Carimbo {
    /// Limpa espaços e aplica o texto padrão quando vier vazio.
    pub fn normalized(&self) -> Carimbo {
        let texto = self.texto.trim();
        Carimbo {
            resp: self.resp.trim().to_string(),
            inst: self.inst.trim().to_string(),
            contato: self.contato.trim().to_string(),
            texto: if texto.is_empty() {
                CARIMBO_TEXTO_PADRAO.to_string()
            } else {
                texto.to_string()
            },
            obs: self.obs.trim().to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        [&self.resp, &self.inst, &self.contato, &self.texto, &self.obs]
            .iter()
            .all(|v| v.trim().is_empty())
    }
}

/// Modo de gravação de um PUT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Atualiza o registo, preservando assinatura, dono e carimbo.
    #[default]
    Padrao,
    /// Cria um novo registo a partir dos valores enviados; exige nova assinatura.
    Nova,
}

/// Corpo JSON de criação/edição.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TutoriaPayload {
    pub tutor_nome: String,
    pub nome_aluno: String,
    pub serie: String,
    pub tel_aluno: String,
    pub tel_resp: String,
    pub contatos_extra: Vec<Contato>,
    pub projeto_vida: String,
    pub descricoes: String,
    pub ocorrencias: Vec<String>,
    pub assinatura: String,
    pub modo: UpdateMode,
}

/// Valores já normalizados prontos para a DB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutoriaFields {
    pub tutor_nome: String,
    pub nome_aluno: String,
    pub serie: String,
    pub tel_aluno: String,
    pub tel_resp: String,
    pub contatos_extra: String,
    pub projeto_vida: String,
    pub descricoes: String,
    pub ocorrencias: String,
    pub assinatura: String,
}

impl TutoriaPayload {
    pub fn to_fields(&self) -> TutoriaFields {
        TutoriaFields {
            tutor_nome: self.tutor_nome.trim().to_string(),
            nome_aluno: self.nome_aluno.trim().to_string(),
            serie: self.serie.trim().to_string(),
            tel_aluno: self.tel_aluno.trim().to_string(),
            tel_resp: self.tel_resp.trim().to_string(),
            contatos_extra: serialize_contatos(&self.contatos_extra),
            projeto_vida: self.projeto_vida.trim().to_string(),
            descricoes: self.descricoes.trim().to_string(),
            ocorrencias: join_tags(&self.ocorrencias),
            assinatura: self.assinatura.trim().to_string(),
        }
    }
}

/// Cópia transitória usada pelo "duplicar": sem id nem datas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutoriaDraft {
    pub tutor_nome: String,
    pub nome_aluno: String,
    pub serie: String,
    pub tel_aluno: String,
    pub tel_resp: String,
    pub contatos: Vec<Contato>,
    pub projeto_vida: String,
    pub descricoes: String,
    pub ocorrencias: Vec<String>,
    pub assinatura: String,
}

/// O que o formulário mostra.
#[derive(Debug, Clone)]
pub enum FormRecord {
    Nova,
    Existing(Tutoria),
    Draft(TutoriaDraft),
}

/// Resultado de um PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(i64),
    Created(i64),
}

impl UpdateOutcome {
    pub fn id(&self) -> i64 {
        match self {
            UpdateOutcome::Updated(id) | UpdateOutcome::Created(id) => *id,
        }
    }
}

/// Exportação JSON completa usada pelo painel de gestão.
#[derive(Debug, Clone, Serialize)]
pub struct TutoriaExport {
    pub id: i64,
    pub professor_id: i64,
    pub tutor_nome: String,
    pub nome_aluno: String,
    pub serie: String,
    pub tel_aluno: String,
    pub tel_resp: String,
    pub contatos_extra: Vec<Contato>,
    pub projeto_vida: String,
    pub descricoes: String,
    pub ocorrencias: Vec<String>,
    pub assinatura: String,
    pub carimbo: Carimbo,
    pub criado_em: String,
    pub atualizado_em: String,
}

impl From<&Tutoria> for TutoriaExport {
    fn from(t: &Tutoria) -> Self {
        Self {
            id: t.id,
            professor_id: t.professor_id,
            tutor_nome: text_or_empty(&t.tutor_nome),
            nome_aluno: t.nome_aluno.clone(),
            serie: t.serie.clone(),
            tel_aluno: text_or_empty(&t.tel_aluno),
            tel_resp: text_or_empty(&t.tel_resp),
            contatos_extra: t.contatos(),
            projeto_vida: text_or_empty(&t.projeto_vida),
            descricoes: text_or_empty(&t.descricoes),
            ocorrencias: t.tags(),
            assinatura: t.assinatura().to_string(),
            carimbo: t.carimbo(),
            criado_em: t.criado_em.format("%Y-%m-%dT%H:%M:%S").to_string(),
            atualizado_em: t.atualizado_em.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

// --- Codificação das colunas de texto ---

/// Serializa os contactos como JSON, limpando espaços e descartando pares vazios.
pub fn serialize_contatos(contatos: &[Contato]) -> String {
    let limpos: Vec<Contato> = contatos
        .iter()
        .map(|c| Contato {
            nome: c.nome.trim().to_string(),
            telefone: c.telefone.trim().to_string(),
        })
        .filter(|c| !c.nome.is_empty() || !c.telefone.is_empty())
        .collect();
    // Vec<Contato> com Strings não falha a serializar
    serde_json::to_string(&limpos).unwrap_or_else(|_| "[]".to_string())
}

/// Lê a coluna de contactos. Vazio ou JSON inválido resulta numa lista vazia.
pub fn parse_contatos(raw: Option<&str>) -> Vec<Contato> {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Vec::new(),
    };
    match serde_json::from_str::<Vec<Contato>>(raw) {
        Ok(lista) => lista
            .into_iter()
            .filter(|c| !c.nome.trim().is_empty() || !c.telefone.trim().is_empty())
            .collect(),
        Err(e) => {
            tracing::warn!("contatos_extra inválido, a tratar como vazio: {}", e);
            Vec::new()
        }
    }
}

/// Junta as ocorrências numa string separada por vírgulas.
/// Vírgulas dentro de um valor viram espaço; valores vazios são descartados.
pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.replace(',', " ").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or("")
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
