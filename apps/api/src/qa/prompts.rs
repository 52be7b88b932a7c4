// Prompt constants for Retrieval QA. All generative calls go through
// llm_client; this module only builds the strings.

/// System prompt for grounded question answering over the candidate pool.
pub const QA_SYSTEM: &str = "You are a recruiting assistant answering questions about a \
    pool of candidates. \
    Answer ONLY from the context excerpts provided. \
    If the context does not contain the answer, say so plainly. \
    Do NOT invent candidates, skills, or qualifications. \
    Keep answers concise and factual.";

/// QA prompt template. Replace `{context}` and `{question}` before sending.
pub const QA_PROMPT_TEMPLATE: &str = "\
Answer the question using only the following excerpts from candidate documents.

CONTEXT:
{context}

QUESTION:
{question}";
