pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4-0125-preview";
pub const DEFAULT_SCORE_MODEL: &str = "gpt-4-0125-preview";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_COLLECTION: &str = "vector";

pub const DEFAULT_CHAT_SYSTEM_PROMPT: &str = "You are ChatIRIS, a friendly and patient health \
educator. You help people understand colorectal cancer screening: why it matters, how the \
different tests are performed, what they cost and how to prepare for them. Keep answers short, \
warm and easy to read. Never diagnose. Encourage the user to talk to their doctor about their \
personal situation. When additional notes about the user's beliefs are provided, use them to \
address their concerns gently, without repeating the notes back to the user.";

pub const DEFAULT_CHAT_GREETING: &str = "Hello! I'm ChatIRIS. I can answer your questions about \
colorectal cancer screening. What would you like to know?";

pub const DEFAULT_SCORE_SYSTEM_PROMPT: &str = "You assess the health beliefs of a USER talking \
with a colorectal cancer screening assistant. Read the conversation and call the update_beliefs \
tool with a score for every belief the USER's own messages give evidence about: 1 if the USER \
affirms the belief, -1 if the USER disagrees with it, 0 if there is no evidence. Do not score \
beliefs based on the assistant's messages. The beliefs are:";

pub const DEFAULT_RAG_QUERY_TEMPLATE: &str = "The following is the USER's last message. Please \
identify the relevant snippets if any. If there are no relevant snippets, only reply NIL\n {query}";

pub const DEFAULT_RAG_RESPONSE_TEMPLATE: &str = "The following is the USER's last message: \
{query}.Only use information from the following snippets to provide an answer. If there are no \
relevant snippets, do not assume any context about the user. \n {context}";

pub fn default_faq() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "faq_cost",
            "How much does colorectal cancer screening cost?",
        ),
        (
            "faq_procedure",
            "How is colorectal cancer screening performed?",
        ),
        (
            "faq_benefits",
            "What are the benefits of colorectal cancer screening?",
        ),
    ]
}

pub fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8501".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8501".to_string(),
    ]
}
