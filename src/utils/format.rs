use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Amount, LeaderboardEntry, TrendDirection};

const SHANGHAI_OFFSET_SECS: i32 = 8 * 3600;

/// 千分位分组，小数位数在 [min_frac, max_frac] 之间，.5 远离零舍入
fn group_number(value: Decimal, min_frac: usize, max_frac: usize) -> String {
    let mut rounded = value
        .abs()
        .round_dp_with_strategy(max_frac as u32, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(max_frac as u32);

    let fixed = rounded.to_string();
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (fixed.clone(), String::new()),
    };

    let mut frac = frac_part;
    while frac.len() > min_frac && frac.ends_with('0') {
        frac.pop();
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value.is_sign_negative() && !rounded.is_zero();
    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

/// 排行榜分数：最多两位小数
pub fn format_score(score: &Amount) -> String {
    group_number(score.value(), 0, 2)
}

/// 金额：固定两位小数
pub fn format_amount(amount: &Amount) -> String {
    group_number(amount.value(), 2, 2)
}

pub fn format_rank(rank: i64) -> String {
    if rank <= 0 {
        "-".to_string()
    } else {
        format!("#{rank}")
    }
}

/// 按字符截断，超出部分以省略号结尾
pub fn truncate_text(value: Option<&str>, max_chars: usize) -> String {
    let Some(value) = value else {
        return String::new();
    };
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let head: String = value.chars().take(max_chars).collect();
    format!("{head}…")
}

/// 领取时间：当天（上海时区）只显示时分，否则显示完整日期
pub fn format_claimed_at(claimed_at: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = claimed_at else {
        return "-".to_string();
    };
    let Ok(parsed) = DateTime::parse_from_rfc3339(raw) else {
        return "-".to_string();
    };
    let Some(tz) = FixedOffset::east_opt(SHANGHAI_OFFSET_SECS) else {
        return "-".to_string();
    };

    let local = parsed.with_timezone(&tz);
    if local.date_naive() == now.with_timezone(&tz).date_naive() {
        local.format("%H:%M").to_string()
    } else {
        local.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// 排名变化：之前排名更靠后视为上升
pub fn trend(current: u32, previous: Option<u32>) -> (TrendDirection, u32) {
    match previous {
        None => (TrendDirection::Same, 0),
        Some(prev) if prev == current => (TrendDirection::Same, 0),
        Some(prev) if prev > current => (TrendDirection::Up, prev - current),
        Some(prev) => (TrendDirection::Down, current - prev),
    }
}

/// 领奖台顺序：第二名在左、第一名居中、第三名在右
pub fn podium_order(items: &[LeaderboardEntry]) -> Vec<&LeaderboardEntry> {
    let top: Vec<&LeaderboardEntry> = items.iter().take(3).collect();
    match top.as_slice() {
        [first, second, third] => vec![*second, *first, *third],
        [first, second] => vec![*second, *first],
        [first] => vec![*first],
        _ => Vec::new(),
    }
}
