use crate::model::ScoreContext;

// Literal text tiers. Exact must clear 1000 so nothing assembled from lower
// tiers plus bonuses can reach it.
const EXACT_BASE: i64 = 2000;
const PREFIX_BASE: i64 = 500;
const SUBSTRING_BASE: i64 = 250;

// Pinyin tiers sit on a smaller scale: an exact transliteration match never
// outranks a literal exact match but beats a literal substring match.
const PINYIN_EXACT_BASE: i64 = 800;
const PINYIN_PREFIX_BASE: i64 = 400;
const PINYIN_SUBSTRING_BASE: i64 = 150;

// Every bonus is capped below 250, the smallest gap between adjacent tiers,
// so no single bonus can carry a candidate across a tier boundary.
const APP_TYPE_BONUS: i64 = 50;
const RUNNING_BONUS: i64 = 30;
const HISTORY_MEMBER_BONUS: i64 = 80;
const USAGE_SATURATION: u32 = 100;
const USAGE_STEP: i64 = 2;
const RECENCY_CAP_HOURS: i64 = 240;

/// Score split into the text tier part and the additive bonus part. The
/// ranking layer needs the split: a non-empty query requires a text match,
/// while an empty query ranks on bonuses alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub text: i64,
    pub bonus: i64,
}

impl Score {
    pub fn total(&self) -> i64 {
        self.text + self.bonus
    }
}

/// Deterministic, side-effect-free relevance score. Signals are purely
/// additive so a new signal never destabilizes existing orderings.
pub fn score(label: &str, path: &str, ctx: &ScoreContext) -> i64 {
    breakdown(label, path, ctx).total()
}

pub fn breakdown(label: &str, _path: &str, ctx: &ScoreContext) -> Score {
    let query = ctx.query.trim().to_lowercase();
    let text = if query.is_empty() {
        0
    } else {
        literal_tier(&label.to_lowercase(), &query) + pinyin_tier(ctx, &query)
    };

    Score {
        text,
        bonus: bonuses(ctx),
    }
}

fn literal_tier(label: &str, query: &str) -> i64 {
    if label == query {
        return EXACT_BASE;
    }
    if label.starts_with(query) {
        return PREFIX_BASE;
    }
    if label.contains(query) {
        return SUBSTRING_BASE;
    }
    0
}

fn pinyin_tier(ctx: &ScoreContext, query: &str) -> i64 {
    let full = pinyin_match_rank(ctx.pinyin_full.as_deref(), query);
    let initials = pinyin_match_rank(ctx.pinyin_initials.as_deref(), query);
    full.max(initials)
}

fn pinyin_match_rank(field: Option<&str>, query: &str) -> i64 {
    let Some(raw) = field else {
        return 0;
    };
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return 0;
    }

    if value == query {
        PINYIN_EXACT_BASE
    } else if value.starts_with(query) {
        PINYIN_PREFIX_BASE
    } else if value.contains(query) {
        PINYIN_SUBSTRING_BASE
    } else {
        0
    }
}

fn bonuses(ctx: &ScoreContext) -> i64 {
    let mut bonus = 0;
    if ctx.is_app {
        bonus += APP_TYPE_BONUS;
    }
    if ctx.is_running {
        bonus += RUNNING_BONUS;
    }
    if ctx.is_history_item {
        bonus += HISTORY_MEMBER_BONUS;
    }
    bonus += usage_bonus(ctx.use_count);
    bonus += recency_bonus(ctx.last_used_epoch_secs, ctx.now_epoch_secs);
    bonus
}

fn usage_bonus(use_count: Option<u32>) -> i64 {
    let Some(count) = use_count else {
        return 0;
    };
    (count.min(USAGE_SATURATION) as i64) * USAGE_STEP
}

fn recency_bonus(last_used_epoch_secs: Option<i64>, now_epoch_secs: i64) -> i64 {
    let Some(last_used) = last_used_epoch_secs else {
        return 0;
    };
    if last_used <= 0 {
        return 0;
    }

    let elapsed_hours = now_epoch_secs.saturating_sub(last_used).max(0) / 3600;
    (RECENCY_CAP_HOURS - elapsed_hours).clamp(0, RECENCY_CAP_HOURS)
}

#[cfg(test)]
mod tests {
    use super::{breakdown, score};
    use crate::model::ScoreContext;

    const NOW: i64 = 1_750_000_000;

    fn ctx(query: &str) -> ScoreContext {
        ScoreContext::for_query(query, NOW)
    }

    #[test]
    fn tier_order_is_exact_prefix_substring_none() {
        let exact = score("wechat", "C:\\WeChat.exe", &ctx("wechat"));
        let prefix = score("wechat tools", "C:\\WeChat.exe", &ctx("wechat"));
        let substring = score("my wechat", "C:\\WeChat.exe", &ctx("wechat"));
        let none = score("terminal", "C:\\Terminal.exe", &ctx("wechat"));

        assert!(exact > prefix);
        assert!(prefix > substring);
        assert!(substring > none);
        assert_eq!(none, 0);
    }

    #[test]
    fn exact_match_clears_one_thousand() {
        let exact = score("微信", "C:\\WeChat.exe", &ctx("微信"));
        assert!(exact > 1000);

        let prefix = score("微信应用", "C:\\WeChat.exe", &ctx("微信"));
        assert!(prefix >= 500);
        assert!(prefix < exact);
    }

    #[test]
    fn match_is_case_insensitive() {
        assert_eq!(
            score("WeChat", "C:\\WeChat.exe", &ctx("wechat")),
            score("wechat", "C:\\WeChat.exe", &ctx("WECHAT"))
        );
    }

    #[test]
    fn pinyin_exact_beats_literal_substring_but_not_literal_exact() {
        let mut pinyin_ctx = ctx("weixin");
        pinyin_ctx.pinyin_full = Some("weixin".to_string());
        let pinyin_exact = score("微信", "C:\\WeChat.exe", &pinyin_ctx);

        let literal_substring = score("some weixin here", "C:\\WeChat.exe", &ctx("weixin"));
        let literal_exact = score("weixin", "C:\\WeChat.exe", &ctx("weixin"));

        assert!(pinyin_exact > literal_substring);
        assert!(pinyin_exact < literal_exact);
    }

    #[test]
    fn pinyin_initials_match_as_fallback() {
        let mut context = ctx("wx");
        context.pinyin_initials = Some("wx".to_string());
        assert!(score("微信", "C:\\WeChat.exe", &context) > 0);
    }

    #[test]
    fn usage_bonus_is_monotonic_and_saturates() {
        let low = score("app", "C:\\App.exe", &ctx("app").with_usage(3, 0));
        let high = score("app", "C:\\App.exe", &ctx("app").with_usage(9, 0));
        assert!(high > low);

        let saturated = score("app", "C:\\App.exe", &ctx("app").with_usage(100, 0));
        let beyond = score("app", "C:\\App.exe", &ctx("app").with_usage(5000, 0));
        assert_eq!(saturated, beyond);
    }

    #[test]
    fn one_hour_ago_outranks_one_day_ago() {
        let hour = score("app", "C:\\App.exe", &ctx("app").with_usage(1, NOW - 3600));
        let day = score("app", "C:\\App.exe", &ctx("app").with_usage(1, NOW - 86_400));
        let week = score("app", "C:\\App.exe", &ctx("app").with_usage(1, NOW - 7 * 86_400));
        assert!(hour > day);
        assert!(day > week);
    }

    #[test]
    fn empty_query_scores_zero_text_but_keeps_bonuses() {
        let split = breakdown("app", "C:\\App.exe", &ctx("").with_usage(4, NOW - 3600));
        assert_eq!(split.text, 0);
        assert!(split.bonus > 0);
    }

    #[test]
    fn no_single_bonus_crosses_a_tier_boundary() {
        // a substring match plus any one bonus must stay below a bare prefix match
        let bare_prefix = score("wechat tools", "C:\\WeChat.exe", &ctx("wechat"));

        let mut just_recency = ctx("wechat");
        just_recency.last_used_epoch_secs = Some(NOW);
        assert!(score("open wechat now", "C:\\WeChat.exe", &just_recency) < bare_prefix);

        let mut just_usage = ctx("wechat");
        just_usage.use_count = Some(10_000);
        assert!(score("open wechat now", "C:\\WeChat.exe", &just_usage) < bare_prefix);

        let mut just_membership = ctx("wechat");
        just_membership.is_history_item = true;
        assert!(score("open wechat now", "C:\\WeChat.exe", &just_membership) < bare_prefix);
    }

    #[test]
    fn type_and_running_bonuses_break_ties() {
        let mut app_ctx = ctx("code");
        app_ctx.is_app = true;
        let plain = score("code", "C:\\Code.exe", &ctx("code"));
        let app = score("code", "C:\\Code.exe", &app_ctx);
        assert!(app > plain);

        app_ctx.is_running = true;
        assert!(score("code", "C:\\Code.exe", &app_ctx) > app);
    }

    #[test]
    fn query_longer_than_label_only_matches_exactly() {
        assert_eq!(score("code", "C:\\Code.exe", &ctx("code editor")), 0);
        assert!(score("code editor", "C:\\Code.exe", &ctx("code editor")) > 1000);
    }
}
