/*!
 * Keyword tables used by content analysis and highlight scoring.
 *
 * These are plain data. Each table maps a label to the words whose presence
 * tags that label. Chinese and English keywords share a table; matching rules
 * live in [`contains_keyword`].
 */

/// Theme label and the keywords that tag it
pub type KeywordTable = &'static [(&'static str, &'static [&'static str])];

/// Theme keyword bags
pub const THEME_KEYWORDS: KeywordTable = &[
    ("romance", &["爱情", "恋爱", "喜欢", "爱", "情侣", "约会", "表白", "心动", "love", "romance", "date", "kiss", "crush"]),
    ("friendship", &["朋友", "友谊", "友情", "伙伴", "同伴", "兄弟", "姐妹", "闺蜜", "friend", "friends", "friendship", "buddy", "partner"]),
    ("family", &["家庭", "父母", "孩子", "家人", "亲情", "家", "爸爸", "妈妈", "family", "mother", "father", "mom", "dad", "parents", "son", "daughter"]),
    ("work", &["工作", "职业", "事业", "公司", "老板", "同事", "项目", "会议", "work", "job", "career", "boss", "office", "meeting", "project"]),
    ("study", &["学习", "学校", "老师", "学生", "考试", "知识", "课程", "作业", "school", "teacher", "student", "exam", "class", "homework"]),
    ("adventure", &["冒险", "探险", "旅行", "发现", "挑战", "勇气", "未知", "探索", "adventure", "journey", "explore", "discover", "challenge", "courage"]),
    ("mystery", &["秘密", "谜团", "调查", "真相", "线索", "推理", "神秘", "隐藏", "secret", "mystery", "investigate", "truth", "clue", "hidden"]),
    ("growth", &["成长", "改变", "学会", "明白", "成熟", "经历", "感悟", "蜕变", "grow", "change", "learned", "realize", "understand"]),
];

/// Emotion keyword bags
pub const EMOTION_KEYWORDS: KeywordTable = &[
    ("joy", &["开心", "高兴", "快乐", "兴奋", "愉快", "欢乐", "笑", "哈哈", "happy", "glad", "excited", "laugh", "haha", "fun"]),
    ("sadness", &["悲伤", "难过", "伤心", "痛苦", "哭", "眼泪", "失落", "沮丧", "sad", "cry", "tears", "hurt", "lonely", "miss"]),
    ("anger", &["愤怒", "生气", "恼火", "暴怒", "气愤", "讨厌", "烦躁", "愤慨", "angry", "mad", "furious", "hate", "annoyed"]),
    ("surprise", &["惊讶", "震惊", "吃惊", "意外", "惊奇", "不敢相信", "天哪", "哇", "surprise", "shocked", "unbelievable", "wow", "omg"]),
    ("fear", &["害怕", "恐惧", "担心", "紧张", "焦虑", "恐慌", "可怕", "吓人", "afraid", "scared", "fear", "worried", "nervous", "terrified"]),
    ("touched", &["感动", "温暖", "感激", "谢谢", "温馨", "暖心", "触动", "感谢", "touched", "grateful", "thank", "thanks", "warm"]),
];

/// Words that mark a narration line as notable, grouped by kind
pub const IMPORTANCE_KEYWORDS: KeywordTable = &[
    ("dialogue", &["说", "问", "回答", "告诉", "喊", "said", "asked", "told", "replied", "shouted", "whispered"]),
    ("emotion", &["爱", "恨", "哭", "愤怒", "震惊", "害怕", "感动", "love", "hate", "cry", "angry", "shocked", "afraid", "tears"]),
    ("plot", &["秘密", "真相", "终于", "突然", "发现", "决定", "危险", "关键", "重要", "高潮", "secret", "truth", "finally", "suddenly", "reveal", "discover", "decide", "danger", "key", "climax"]),
];

/// Words that look like names but describe settings, sounds or roles
pub const NON_CHARACTER_WORDS: &[&str] = &[
    "时间", "地点", "场景", "背景", "音乐", "效果", "旁白", "画外音",
    "咖啡店", "书店", "学校", "公司", "家里", "房间", "客厅",
    "time", "place", "scene", "location", "background", "music", "effects",
    "narrator", "voiceover", "cafe", "bookstore", "school", "office", "home",
    "room", "int", "ext", "note",
];

/// Capitalized sentence starters that the English name patterns would otherwise catch
pub const PRONOUNS: &[&str] = &[
    "i", "he", "she", "it", "we", "they", "you", "this", "that", "there",
    "then", "when", "what", "who", "someone", "everyone", "nobody",
];

/// Check whether `haystack` contains `keyword`.
///
/// ASCII keywords match case-insensitively on word boundaries, so "love"
/// does not hit "glove". Other keywords (CJK) match as plain substrings.
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if !keyword.is_ascii() {
        return haystack.contains(keyword);
    }

    let lower = haystack.to_lowercase();
    let needle = keyword.to_lowercase();
    let mut from = 0;

    while let Some(pos) = lower[from..].find(&needle) {
        let begin = from + pos;
        let end = begin + needle.len();
        let before_ok = lower[..begin].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
        let after_ok = lower[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = end;
    }

    false
}

/// Labels of `table` with at least one keyword present in `text`, in table order
pub fn matching_labels(table: KeywordTable, text: &str) -> Vec<&'static str> {
    table
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| contains_keyword(text, kw)))
        .map(|(label, _)| *label)
        .collect()
}
