//! 远端对象命名与 HTML 片段拼装。

use super::source::{CandidateRole, SourceFile};

/// 所有上传对象共用的键前缀。
pub const DEFAULT_KEY_PREFIX: &str = "images/";

/// `<basename>_full<ext>` / `<basename>_thumb<ext>`。
pub fn derive_object_name(source: &SourceFile, role: CandidateRole) -> String {
    object_name_for(source.basename(), source.extension(), role)
}

pub(crate) fn object_name_for(basename: &str, extension: &str, role: CandidateRole) -> String {
    format!("{}{}{}", basename, role.name_suffix(), extension)
}

/// 去掉上传前缀，得到公开链接使用的对象名。
pub fn strip_key_prefix<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

/// `<a href="…"><img src="…" alt="…"></a>`
///
/// 三个属性值都经过 `escape_attribute`，有意不再原样拼接：`Tom & Jerry` 输出为 `Tom &amp; Jerry`。
pub fn render_snippet(full_url: &str, thumb_url: &str, alt_text: &str) -> String {
    format!(
        r#"<a href="{}"><img src="{}" alt="{}"></a>"#,
        escape_attribute(full_url),
        escape_attribute(thumb_url),
        escape_attribute(alt_text)
    )
}

/// 转义双引号属性值中的 `&`、`"`、`<`、`>`。
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_role_suffix() {
        assert_eq!(object_name_for("photo", ".jpg", CandidateRole::Full), "photo_full.jpg");
        assert_eq!(object_name_for("photo", ".jpg", CandidateRole::Thumbnail), "photo_thumb.jpg");
        assert_eq!(object_name_for("scan", "", CandidateRole::Full), "scan_full");
    }

    #[test]
    fn snippet_matches_published_format() {
        let html = render_snippet(
            "https://cdn.example/photo_full.jpg",
            "https://cdn.example/photo_thumb.jpg",
            "a cat",
        );
        assert_eq!(
            html,
            r#"<a href="https://cdn.example/photo_full.jpg"><img src="https://cdn.example/photo_thumb.jpg" alt="a cat"></a>"#
        );
    }

    #[test]
    fn alt_text_quotes_are_escaped() {
        let html = render_snippet("u1", "u2", r#"the "best" <cat> & dog"#);
        assert!(html.ends_with(r#"alt="the &quot;best&quot; &lt;cat&gt; &amp; dog"></a>"#));
    }

    #[test]
    fn ampersand_in_alt_text_is_not_emitted_raw() {
        let html = render_snippet("u1", "u2", "Tom & Jerry");
        assert!(html.ends_with(r#"alt="Tom &amp; Jerry"></a>"#));
    }

    #[test]
    fn prefix_is_stripped_only_when_present() {
        assert_eq!(strip_key_prefix("images/photo_full.jpg", "images/"), "photo_full.jpg");
        assert_eq!(strip_key_prefix("other/photo_full.jpg", "images/"), "other/photo_full.jpg");
    }
}
