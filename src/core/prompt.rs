use crate::domain::model::{Schema, KEY_SEPARATOR, PAIR_SEPARATOR};

pub const DEFAULT_INSTRUCTION: &str = "画像から文字を読み取ってください。";

/// `{fields}` and `{example}` are filled from the schema.
const PROMPT_TEMPLATE: &str = "{instruction}
読み取った内容を次の項目に分けて、「項目名：値」の形式で出力してください。
項目と項目の間は半角カンマ(,)で区切り、1行で出力してください。
項目名は次のものだけを使い、読み取れない項目は省略してください。
項目: {fields}
出力例: {example}";

const EXAMPLE_VALUE: &str = "…";

pub fn build_prompt(schema: &Schema, instruction: Option<&str>) -> String {
    let separator = format!("{} ", PAIR_SEPARATOR);
    let fields = schema.fields().join(&separator);
    let example = schema
        .fields()
        .iter()
        .map(|field| format!("{}{}{}", field, KEY_SEPARATOR, EXAMPLE_VALUE))
        .collect::<Vec<_>>()
        .join(&separator);

    PROMPT_TEMPLATE
        .replace("{instruction}", instruction.unwrap_or(DEFAULT_INSTRUCTION))
        .replace("{fields}", &fields)
        .replace("{example}", &example)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_reply;

    #[test]
    fn test_prompt_lists_every_field() {
        let schema = Schema::customer_card();
        let prompt = build_prompt(&schema, None);

        assert!(prompt.starts_with(DEFAULT_INSTRUCTION));
        for field in schema.fields() {
            assert!(prompt.contains(field.as_str()));
        }
        assert!(prompt.contains("出力例: NO：…, 氏名：…"));
    }

    #[test]
    fn test_example_line_parses_with_reply_grammar() {
        let schema = Schema::new(["NO", "氏名"]).unwrap();
        let prompt = build_prompt(&schema, Some("カードを読んでください。"));
        let example = prompt.lines().last().unwrap().trim_start_matches("出力例: ");

        let record = parse_reply(&schema, example);
        assert_eq!(record.get("NO"), Some("…"));
        assert_eq!(record.get("氏名"), Some("…"));
        assert!(prompt.starts_with("カードを読んでください。"));
    }
}
