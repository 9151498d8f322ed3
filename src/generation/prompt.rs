use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::services::templates::{TemplateError, TemplateStore};

/// Fragments every system prompt needs, in the order they are loaded.
pub const TITLE_RULES: &str = "title-rules";
pub const INTRO_RULES: &str = "intro-rules";
pub const REFERENCE_FRAGMENTS: [&str; 6] = [
    "reference-1",
    "reference-2",
    "reference-3",
    "reference-4",
    "reference-5",
    "reference-6",
];
pub const PRECEDENT_FRAGMENTS: [&str; 7] = [
    "precedent-1",
    "precedent-2",
    "precedent-3",
    "precedent-4",
    "precedent-5",
    "precedent-6",
    "precedent-7",
];

/// Category label used when the request names none.
pub const DEFAULT_CATEGORY: &str = "일반";

/// Output contract embedded verbatim in every system prompt.
pub const OUTPUT_SCHEMA: &str = r#"{
  "title": "string (H1 제목, 제목 형식은 반드시 제목 작성 규칙을 따른다)",
  "intro": "string (도입부 출력 형식
(3줄)
제목 작성 후 반드시 도입부(3~5문장)를 작성하며, 도입부에는 키워드를 포함하지 않는다. 도입부는 다음 5가지 형식 중 하나를 자동 선택해 작성한다.

1️⃣ 표 형식 도입부: ‘좋은 대처법 vs 잘못된 대처법’ 표 후 간단한 해석.
2️⃣ 대화체 도입부: 피해자-사기범 대화 후 전문가의 코멘트.
3️⃣ 체크리스트 도입부: 사기 수법의 특징 4가지 ✔️로 제시.
4️⃣ 뉴스 인용 도입부: 실제 뉴스 사례 요약 + 질문 연결.
5️⃣ FAQ 도입부: 피해자 질문 인용 + “이 글을 끝까지 읽어보세요.” 문장.

도입부 형식은 구성 선택(1~7)에 따라 자동 결정한다.",
  "body": "string (markdown, H2/H3 구조 포함, 본문 전체, 최소 3개의 소제목 포함,
   전체 문체는 구성 선택 번호에 따라 일관성 유지,
   글 쓸 때 마다 글의 구성과 문단의 순서가 완전히 달라야함)",
  "conclusion": "string (결론은 ‘요약 → 공감 문장 → 클릭 유도 문장’ 순으로 구성.)",
  "summary_table": "string (markdown table, 글 전체 요약)"
}"#;

const COMMON_RULES: &str = "\
- 모든 값은 markdown 문자열
- title에는 #을 쓰지 말고 제목 텍스트만 작성
- intro는 3~5문장 엄수, 도입부 형식 규칙 준수
- body는 H2/H3 구조 필수, 2,000자 이상
- conclusion에는 반드시 bullet 리스트 포함
- summary_table은 markdown table 필수";

/// Every fragment id the assembler reads, in prompt order.
pub fn required_fragments() -> impl Iterator<Item = &'static str> {
    [TITLE_RULES, INTRO_RULES]
        .into_iter()
        .chain(REFERENCE_FRAGMENTS)
        .chain(PRECEDENT_FRAGMENTS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneKey {
    Expert,
    Warning,
    Friendly,
    News,
    Firm,
    Comfort,
}

impl ToneKey {
    pub const ALL: [ToneKey; 6] = [
        ToneKey::Expert,
        ToneKey::Warning,
        ToneKey::Friendly,
        ToneKey::News,
        ToneKey::Firm,
        ToneKey::Comfort,
    ];

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tone| tone.as_str() == key)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneKey::Expert => "expert",
            ToneKey::Warning => "warning",
            ToneKey::Friendly => "friendly",
            ToneKey::News => "news",
            ToneKey::Firm => "firm",
            ToneKey::Comfort => "comfort",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            ToneKey::Expert => {
                "- 문체는 판례·조문을 인용하는 전문 변호사 시점\n- 감정 표현 최소화\n- 단정적이고 분석 중심"
            }
            ToneKey::Warning => {
                "- 독자에게 경고하는 어조\n- 위험 요소를 반복적으로 강조\n- \"주의해야 합니다\", \"매우 위험합니다\" 같은 표현 적극 사용"
            }
            ToneKey::Friendly => {
                "- 법률 비전문가도 이해할 수 있도록 쉽게 설명\n- 어려운 용어는 반드시 풀어서 설명\n- 친절한 말투 유지"
            }
            ToneKey::News => {
                "- 객관적 기사체 문장\n- 감정 표현 금지\n- \"~로 알려졌다\", \"~로 보인다\" 형식 사용"
            }
            ToneKey::Firm => {
                "- 단호하고 강한 어조\n- 불필요한 완곡어법 금지\n- 명령형, 확정적 문장 사용"
            }
            ToneKey::Comfort => {
                "- 피해자 감정에 공감\n- 위로하는 말투\n- 비난·단정 표현 절대 사용 금지"
            }
        }
    }
}

/// Tone instruction for an optional key; absent tone yields an empty instruction.
pub fn tone_instruction(tone: Option<ToneKey>) -> &'static str {
    tone.map(|t| t.instruction()).unwrap_or("")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt fragment '{0}' is missing")]
    MissingFragment(String),
}

/// Raw fragment text keyed by fragment id. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct PromptTemplateSet {
    fragments: HashMap<String, String>,
}

impl PromptTemplateSet {
    pub fn from_map(fragments: HashMap<String, String>) -> Self {
        Self { fragments }
    }

    /// Read every required fragment from the store, failing on the first one missing.
    pub async fn load(store: &dyn TemplateStore) -> Result<Self, TemplateError> {
        let mut fragments = HashMap::new();
        for id in required_fragments() {
            let text = store.read(id).await?;
            fragments.insert(id.to_string(), text);
        }
        tracing::debug!("Loaded {} prompt fragments", fragments.len());
        Ok(Self { fragments })
    }

    fn get(&self, id: &str) -> Result<&str, PromptError> {
        self.fragments
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| PromptError::MissingFragment(id.to_string()))
    }
}

/// The single system instruction sent ahead of the caller's messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt(String);

impl SystemPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the system prompt from fragments, tone and category.
///
/// Pure: the same inputs always produce the same prompt. Every required
/// fragment must be present in `templates`.
pub fn assemble_system_prompt(
    templates: &PromptTemplateSet,
    tone: Option<ToneKey>,
    category: Option<&str>,
) -> Result<SystemPrompt, PromptError> {
    let references = join_fragments(templates, &REFERENCE_FRAGMENTS)?;
    let precedents = join_fragments(templates, &PRECEDENT_FRAGMENTS)?;
    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY);

    let prompt = format!(
        "당신은 **10년 이상 경력의 한국 변호사**입니다.\n\
         아래 JSON 스키마를 **정확히** 따르세요.\n\
         JSON 이외의 출력은 **절대 금지**합니다.\n\
         \n\
         {schema}\n\
         \n\
         # 작성 톤 규칙\n\
         {tone}\n\
         \n\
         # 제목 작성 규칙\n\
         {title}\n\
         \n\
         # 도입부 형식 규칙\n\
         {intro}\n\
         \n\
         ------\n\
         # 공통 작성 규칙\n\
         {common}\n\
         \n\
         # 참고 지식 (재작성용, 복붙 금지)\n\
         {references}\n\
         \n\
         # 작성할 때 참고할 판례\n\
         {precedents}\n\
         \n\
         # 사건 유형\n\
         {category}\n\
         \n\
         출력 전에 스스로 검증하고,\n\
         조건을 하나라도 만족하지 못하면 **다시 작성**하라.\n\
         글을 작성할 때마다 글 구성이 무조건 다르게 하라.\n",
        schema = OUTPUT_SCHEMA,
        tone = tone_instruction(tone),
        title = templates.get(TITLE_RULES)?,
        intro = templates.get(INTRO_RULES)?,
        common = COMMON_RULES,
        references = references,
        precedents = precedents,
        category = category,
    );

    Ok(SystemPrompt(prompt))
}

fn join_fragments(templates: &PromptTemplateSet, ids: &[&str]) -> Result<String, PromptError> {
    let parts = ids
        .iter()
        .map(|id| templates.get(id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("\n"))
}
