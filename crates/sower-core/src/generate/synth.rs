use std::borrow::Cow;

use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use fake::faker::address::en::*;
use fake::faker::company::en::*;
use fake::faker::internet::en::*;
use fake::faker::lorem::en::*;
use fake::faker::name::en::*;
use fake::faker::phone_number::en::*;
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use uuid::Uuid;

use crate::generate::value::Value;
use crate::schema::types::{Column, TypeCategory};

/// Wrap a dynamically generated String into a Value::String.
#[inline]
fn owned(s: String) -> Value {
    Value::String(Cow::Owned(s))
}

/// Wrap a static string literal into a Value::String (zero heap allocation).
#[inline]
fn borrowed(s: &'static str) -> Value {
    Value::String(Cow::Borrowed(s))
}

fn hex_string(rng: &mut StdRng, len: usize) -> String {
    const HEX: &[u8] = b"0123456789abcdef";
    (0..len)
        .map(|_| HEX[rng.random_range(0..16)] as char)
        .collect()
}

fn choice(rng: &mut StdRng, options: &[&'static str]) -> Value {
    match options.choose(rng) {
        Some(s) => borrowed(s),
        None => Value::Null,
    }
}

fn recent_timestamp(rng: &mut StdRng, base_time: NaiveDateTime) -> NaiveDateTime {
    base_time
        - ChronoDuration::days(rng.random_range(0..365))
        - ChronoDuration::seconds(rng.random_range(0..86_400))
}

fn deterministic_uuid(rng: &mut StdRng) -> Uuid {
    // v4-shaped but drawn from the injected rng, so seeded runs reproduce.
    Uuid::from_u128(rng.random::<u128>())
}

/// One entry in the ordered name-rule table. Rules are evaluated
/// top-to-bottom against the lowercased column name; first match wins.
struct NameRule {
    label: &'static str,
    matches: fn(&str) -> bool,
    generate: fn(&mut StdRng, NaiveDateTime) -> Value,
}

static NAME_RULES: &[NameRule] = &[
    NameRule {
        label: "email",
        matches: |n| n.contains("email"),
        generate: |rng, _| owned(SafeEmail().fake_with_rng(rng)),
    },
    NameRule {
        label: "phone",
        matches: |n| n.contains("phone") || n.contains("mobile") || n.contains("tel"),
        generate: |rng, _| {
            let phone: String = PhoneNumber().fake_with_rng(rng);
            owned(phone.chars().take(20).collect())
        },
    },
    NameRule {
        label: "first_name",
        matches: |n| matches!(n, "first_name" | "firstname" | "fname"),
        generate: |rng, _| owned(FirstName().fake_with_rng(rng)),
    },
    NameRule {
        label: "last_name",
        matches: |n| matches!(n, "last_name" | "lastname" | "lname" | "surname"),
        generate: |rng, _| owned(LastName().fake_with_rng(rng)),
    },
    NameRule {
        label: "full_name",
        matches: |n| matches!(n, "name" | "full_name" | "fullname" | "username"),
        generate: |rng, _| owned(Name().fake_with_rng(rng)),
    },
    NameRule {
        label: "address",
        matches: |n| n.contains("address"),
        generate: |rng, _| {
            let number: String = BuildingNumber().fake_with_rng(rng);
            let street: String = StreetName().fake_with_rng(rng);
            let city: String = CityName().fake_with_rng(rng);
            owned(format!("{} {}, {}", number, street, city))
        },
    },
    NameRule {
        label: "city",
        matches: |n| n.contains("city"),
        generate: |rng, _| owned(CityName().fake_with_rng(rng)),
    },
    NameRule {
        label: "state",
        matches: |n| n.contains("state") || n.contains("province"),
        generate: |rng, _| owned(StateName().fake_with_rng(rng)),
    },
    NameRule {
        label: "country",
        matches: |n| n.contains("country"),
        generate: |rng, _| owned(CountryName().fake_with_rng(rng)),
    },
    NameRule {
        label: "postal_code",
        matches: |n| n.contains("zip") || n.contains("postal"),
        generate: |rng, _| owned(ZipCode().fake_with_rng(rng)),
    },
    NameRule {
        label: "url",
        matches: |n| n.contains("url") || n.contains("website") || n.contains("link"),
        generate: |rng, _| {
            let word: String = Word().fake_with_rng(rng);
            owned(format!("https://{}.example.com", word))
        },
    },
    NameRule {
        label: "ip",
        matches: |n| n == "ip" || n.ends_with("_ip") || (n.contains("ip") && n.contains("address")),
        generate: |rng, _| owned(IPv4().fake_with_rng(rng)),
    },
    NameRule {
        label: "description",
        matches: |n| n.contains("description") || n.contains("desc"),
        generate: |rng, _| {
            let sentences: Vec<String> = Sentences(2..4).fake_with_rng(rng);
            owned(sentences.join(" "))
        },
    },
    NameRule {
        label: "title",
        matches: |n| n.contains("title"),
        generate: |rng, _| {
            let sentence: String = Sentence(3..6).fake_with_rng(rng);
            owned(sentence.trim_end_matches('.').to_string())
        },
    },
    NameRule {
        label: "company",
        matches: |n| n.contains("company") || n.contains("organization"),
        generate: |rng, _| owned(CompanyName().fake_with_rng(rng)),
    },
    NameRule {
        label: "uuid",
        matches: |n| n.contains("uuid") || n.contains("guid"),
        generate: |rng, _| Value::Uuid(deterministic_uuid(rng)),
    },
    NameRule {
        label: "password",
        matches: |n| n.contains("password") || n.contains("hash"),
        generate: |rng, _| owned(hex_string(rng, 64)),
    },
    NameRule {
        label: "token",
        matches: |n| n.contains("token") || n.contains("secret"),
        generate: |rng, _| owned(hex_string(rng, 40)),
    },
    NameRule {
        label: "slug",
        matches: |n| n.contains("slug"),
        generate: |rng, _| {
            let words: Vec<String> = Words(2..4).fake_with_rng(rng);
            owned(words.join("-"))
        },
    },
    NameRule {
        label: "color",
        matches: |n| n.contains("color") || n.contains("colour"),
        generate: |rng, _| owned(format!("#{:06x}", rng.random_range(0..0x100_0000))),
    },
    NameRule {
        label: "domain",
        matches: |n| n.contains("domain"),
        generate: |rng, _| {
            let word: String = Word().fake_with_rng(rng);
            owned(format!("{}.example.com", word))
        },
    },
    NameRule {
        label: "audit_timestamp",
        matches: |n| {
            n.contains("created_at")
                || n.contains("updated_at")
                || n.contains("last_login")
                || n.ends_with("_at")
                || n.ends_with("_on")
        },
        generate: |rng, base| Value::Timestamp(recent_timestamp(rng, base)),
    },
    NameRule {
        label: "score",
        matches: |n| n.contains("score") || n.contains("rating"),
        generate: |rng, _| {
            Value::Float((rng.random_range(0.0..100.0_f64) * 100.0).round() / 100.0)
        },
    },
    NameRule {
        label: "discount",
        matches: |n| n.contains("discount"),
        generate: |rng, _| Value::Float((rng.random_range(0.0..0.5_f64) * 100.0).round() / 100.0),
    },
    NameRule {
        label: "quantity",
        matches: |n| n.contains("quantity"),
        generate: |rng, _| Value::Int(rng.random_range(1..=100)),
    },
    NameRule {
        label: "money",
        matches: |n| n.contains("price") || n.contains("cost") || n.contains("amount"),
        generate: |rng, _| {
            Value::Float((rng.random_range(1.0..1000.0_f64) * 100.0).round() / 100.0)
        },
    },
    NameRule {
        label: "count",
        matches: |n| n.contains("count"),
        generate: |rng, _| Value::Int(rng.random_range(0..=1000)),
    },
    NameRule {
        label: "version",
        matches: |n| n.contains("version"),
        generate: |rng, _| Value::Int(rng.random_range(1..=10)),
    },
    NameRule {
        label: "serial",
        matches: |n| n.contains("serial"),
        generate: |rng, _| owned(hex_string(rng, 16)),
    },
    NameRule {
        label: "certificate_party",
        matches: |n| n.contains("subject") || n.contains("issuer"),
        generate: |rng, _| owned(CompanyName().fake_with_rng(rng)),
    },
    NameRule {
        label: "algorithm",
        matches: |n| n.contains("algorithm"),
        generate: |rng, _| choice(rng, &["RSA", "ECDSA", "SHA256", "SHA384", "SHA512"]),
    },
    NameRule {
        label: "key_material",
        matches: |n| n.contains("public_key") || n.contains("key"),
        generate: |rng, _| owned(hex_string(rng, 64)),
    },
    NameRule {
        label: "status",
        matches: |n| n.contains("status"),
        generate: |rng, _| choice(rng, &["active", "inactive", "pending", "completed"]),
    },
    NameRule {
        label: "role",
        matches: |n| n.contains("role"),
        generate: |rng, _| choice(rng, &["admin", "user", "guest", "moderator"]),
    },
    NameRule {
        label: "type",
        matches: |n| n.contains("type"),
        generate: |rng, _| owned(Word().fake_with_rng(rng)),
    },
    NameRule {
        label: "id_code",
        matches: |n| n.ends_with("id") && !n.contains("uuid"),
        generate: |rng, _| {
            let letters: String = (0..3)
                .map(|_| rng.random_range(b'A'..=b'Z') as char)
                .collect();
            owned(format!("{}{:02}", letters, rng.random_range(0..100)))
        },
    },
];

/// Maps a column descriptor to a plausible scalar: ordered name rules first,
/// then type-category fallback, then a generic word.
///
/// `base_time` is pinned when the synthesizer is built; all temporal values
/// are offsets from it, so a seeded run reproduces regardless of wall clock.
pub struct Synthesizer {
    base_time: NaiveDateTime,
}

impl Synthesizer {
    pub fn new(base_time: NaiveDateTime) -> Self {
        Self { base_time }
    }

    /// Synthesize a value for `column`. When `nullable` is true there is a
    /// flat 10% chance of Null before any rule runs.
    pub fn synthesize(&self, rng: &mut StdRng, column: &Column, nullable: bool) -> Value {
        if nullable && rng.random_bool(0.1) {
            return Value::Null;
        }

        let name = column.name.to_lowercase();
        for rule in NAME_RULES {
            if (rule.matches)(&name) {
                tracing::trace!(column = %column.name, rule = rule.label, "name rule matched");
                return (rule.generate)(rng, self.base_time);
            }
        }

        self.type_fallback(rng, column)
    }

    fn type_fallback(&self, rng: &mut StdRng, column: &Column) -> Value {
        match column.type_category {
            TypeCategory::Integer => Value::Int(rng.random_range(1..=10_000)),
            TypeCategory::Float => {
                Value::Float((rng.random_range(0.0..10_000.0_f64) * 100.0).round() / 100.0)
            }
            TypeCategory::Boolean => Value::Bool(rng.random_bool(0.5)),
            TypeCategory::Date => {
                Value::Date(self.base_time.date() - ChronoDuration::days(rng.random_range(0..365)))
            }
            TypeCategory::DateTime => Value::Timestamp(recent_timestamp(rng, self.base_time)),
            TypeCategory::Time => Value::Time(
                NaiveTime::from_num_seconds_from_midnight_opt(rng.random_range(0..86_400), 0)
                    .unwrap_or(NaiveTime::MIN),
            ),
            TypeCategory::Text => {
                let sentences: Vec<String> = Sentences(2..4).fake_with_rng(rng);
                owned(sentences.join(" "))
            }
            TypeCategory::FixedText => {
                let length = column.declared_length.unwrap_or(255) as usize;
                // char(36)/varchar(36) is conventionally UUID storage
                if length == 36 {
                    return owned(deterministic_uuid(rng).to_string());
                }
                let words: Vec<String> = Words(1..6).fake_with_rng(rng);
                let mut text = words.join(" ");
                text.truncate(length.min(200));
                owned(text)
            }
            TypeCategory::Unclassified => owned(Word().fake_with_rng(rng)),
        }
    }
}

/// Derive a guaranteed-fresh variant of `value` once the uniqueness retry
/// budget is spent. `used_count` is the number of values already claimed for
/// the column, so successive calls keep producing distinct results. Returns
/// `None` when the value domain has nothing fresh left (booleans); the
/// caller drops the row and counts the shortfall.
pub fn disambiguate(value: Value, used_count: usize) -> Option<Value> {
    let n = used_count as i64;
    match value {
        // Offsets land beyond the ranges the synthesizer draws from.
        Value::Int(_) => Some(Value::Int(10_001 + n)),
        Value::Float(_) => Some(Value::Float(10_001.0 + n as f64)),
        Value::String(s) => Some(Value::String(Cow::Owned(format!("{}_{}", s, used_count)))),
        Value::Timestamp(ts) => Some(Value::Timestamp(ts + ChronoDuration::seconds(n + 1))),
        Value::Date(d) => Some(Value::Date(d + ChronoDuration::days(n + 1))),
        // Synthesized times carry zero nanoseconds, so a count-derived
        // nonzero nanosecond component never collides with them.
        Value::Time(_) => NaiveTime::from_num_seconds_from_midnight_opt(
            (used_count % 86_400) as u32,
            (used_count / 86_400 + 1) as u32,
        )
        .map(Value::Time),
        Value::Uuid(_) => Some(Value::Uuid(Uuid::from_u128(u128::MAX - used_count as u128))),
        Value::Bool(_) | Value::Null => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn column(name: &str, category: TypeCategory) -> Column {
        Column::new(name.to_string(), category)
    }

    #[test]
    fn test_name_rules_win_over_type_fallback() {
        let synth = Synthesizer::new(base_time());
        let mut rng = StdRng::seed_from_u64(7);

        let email = synth.synthesize(&mut rng, &column("email", TypeCategory::Text), false);
        assert!(email.as_string().unwrap().contains('@'));

        let status = synth.synthesize(&mut rng, &column("status", TypeCategory::Text), false);
        assert!(["active", "inactive", "pending", "completed"]
            .contains(&status.as_string().unwrap()));
    }

    #[test]
    fn test_first_match_wins() {
        // "email_count" contains both "email" and "count"; the email rule
        // sits higher in the table.
        let synth = Synthesizer::new(base_time());
        let mut rng = StdRng::seed_from_u64(7);
        let v = synth.synthesize(&mut rng, &column("email_count", TypeCategory::Text), false);
        assert!(v.as_string().unwrap().contains('@'));
    }

    #[test]
    fn test_audit_suffix_produces_timestamp() {
        let synth = Synthesizer::new(base_time());
        let mut rng = StdRng::seed_from_u64(7);
        let v = synth.synthesize(&mut rng, &column("shipped_at", TypeCategory::Text), false);
        assert!(matches!(v, Value::Timestamp(ts) if ts <= base_time()));
    }

    #[test]
    fn test_id_suffix_produces_short_code() {
        let synth = Synthesizer::new(base_time());
        let mut rng = StdRng::seed_from_u64(7);
        let v = synth.synthesize(&mut rng, &column("external_id", TypeCategory::Text), false);
        let s = v.as_string().unwrap();
        assert_eq!(s.len(), 5);
        assert!(s.chars().take(3).all(|c| c.is_ascii_uppercase()));
        assert!(s.chars().skip(3).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_type_fallbacks() {
        let synth = Synthesizer::new(base_time());
        let mut rng = StdRng::seed_from_u64(7);

        let v = synth.synthesize(&mut rng, &column("misc", TypeCategory::Integer), false);
        assert!(matches!(v, Value::Int(1..=10_000)));

        let v = synth.synthesize(&mut rng, &column("misc", TypeCategory::Boolean), false);
        assert!(matches!(v, Value::Bool(_)));

        let mut uuid_col = column("payload", TypeCategory::FixedText);
        uuid_col.declared_length = Some(36);
        let v = synth.synthesize(&mut rng, &uuid_col, false);
        assert_eq!(v.as_string().unwrap().len(), 36);

        let mut short = column("misc", TypeCategory::FixedText);
        short.declared_length = Some(10);
        let v = synth.synthesize(&mut rng, &short, false);
        assert!(v.as_string().unwrap().len() <= 10);
    }

    #[test]
    fn test_nullable_never_null_when_flag_off() {
        let synth = Synthesizer::new(base_time());
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let v = synth.synthesize(&mut rng, &column("misc", TypeCategory::Integer), false);
            assert!(!v.is_null());
        }
    }

    #[test]
    fn test_nullable_sometimes_null() {
        let synth = Synthesizer::new(base_time());
        let mut rng = StdRng::seed_from_u64(7);
        let nulls = (0..500)
            .filter(|_| {
                synth
                    .synthesize(&mut rng, &column("misc", TypeCategory::Integer), true)
                    .is_null()
            })
            .count();
        // ~10% of 500, allow wide slack
        assert!(nulls > 10 && nulls < 150, "null count {nulls}");
    }

    #[test]
    fn test_deterministic_given_seed() {
        let synth = Synthesizer::new(base_time());
        let col = column("email", TypeCategory::Text);
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(
                synth.synthesize(&mut a, &col, true),
                synth.synthesize(&mut b, &col, true)
            );
        }
    }

    #[test]
    fn test_disambiguate_variants() {
        assert_eq!(
            disambiguate(Value::String("alice".into()), 3)
                .unwrap()
                .as_string(),
            Some("alice_3")
        );
        assert_eq!(disambiguate(Value::Int(5), 3), Some(Value::Int(10_004)));
        let base = base_time();
        assert_eq!(
            disambiguate(Value::Timestamp(base), 0),
            Some(Value::Timestamp(base + ChronoDuration::seconds(1)))
        );
    }

    #[test]
    fn test_disambiguate_time_never_matches_synthesized() {
        // Synthesized times have zero nanoseconds; derived ones never do.
        let fresh = disambiguate(Value::Time(NaiveTime::MIN), 5).unwrap();
        match fresh {
            Value::Time(t) => {
                use chrono::Timelike;
                assert_eq!(t.num_seconds_from_midnight(), 5);
                assert_ne!(t.nanosecond(), 0);
            }
            other => panic!("expected Time, got {other}"),
        }
        assert_ne!(
            disambiguate(Value::Time(NaiveTime::MIN), 1),
            disambiguate(Value::Time(NaiveTime::MIN), 2)
        );
    }

    #[test]
    fn test_disambiguate_exhausted_domains_yield_none() {
        assert_eq!(disambiguate(Value::Bool(true), 2), None);
        assert_eq!(disambiguate(Value::Bool(false), 7), None);
    }
}
