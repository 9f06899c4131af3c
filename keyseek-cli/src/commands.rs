//! Command execution.
//!
//! Each command returns the text to print on stdout; diagnostics go to the log.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use keyseek::{
    CursorData, Dialect, PageQuery, PageSize, Postgres, SortDir, SortSpec, Sqlite, Value,
    decode_token, encode_token, is_valid_sql_identifier, parse_token,
};
use rust_decimal::Decimal;
use serde_json::json;

use crate::cli::{Command, DialectName};
use crate::config::{Config, Profile};
use crate::log::log;

/// Run one command against the loaded configuration and selected profile.
pub fn run(command: &Command, config: &Config, profile: &Profile) -> Result<String> {
    match command {
        Command::Encode { sort, values } => encode(sort.as_deref(), values, profile),
        Command::Decode { token, sort } => decode(token, sort.as_deref(), profile),
        Command::Query {
            table,
            sort,
            fields,
            cursor,
            limit,
            dialect,
        } => {
            let table = table
                .as_deref()
                .or(profile.table.as_deref())
                .context("no table given: pass --table or use a profile with one")?;
            let spec = resolve_spec(sort.as_deref(), profile)?
                .context("no sort given: pass --sort or use a profile with one")?;
            let fields = if fields.is_empty() { &profile.fields } else { fields };
            if !is_valid_sql_identifier(table) {
                bail!("invalid table name '{table}': not a valid SQL identifier");
            }
            if let Some(field) = fields.iter().find(|f| !is_valid_sql_identifier(f)) {
                bail!("invalid field name '{field}': not a valid SQL identifier");
            }

            let default_limit = config.default_limit.to_string();
            let size = PageSize::parse(limit.as_deref().unwrap_or(&default_limit))
                .and_then(|size| size.ensure_at_most(config.max_limit))
                .context("invalid --limit")?;

            let cursor = decode_token(cursor.as_deref(), &spec)
                .context("invalid --cursor")?;

            let request = QueryRequest {
                table,
                spec: &spec,
                fields,
                cursor,
                size,
            };
            match dialect.unwrap_or(config.dialect) {
                DialectName::Postgres => query(Postgres, request),
                DialectName::Sqlite => query(Sqlite, request),
            }
        },
    }
}

/// Sort from the flag, falling back to the profile, checked against the profile whitelist.
fn resolve_spec(flag: Option<&str>, profile: &Profile) -> Result<Option<SortSpec>> {
    let Some(sort) = flag.or(profile.sort.as_deref()) else {
        return Ok(None);
    };
    let spec = SortSpec::parse(sort, &profile.allowed())
        .with_context(|| format!("invalid sort '{sort}'"))?;
    Ok(Some(spec))
}

fn encode(sort: Option<&str>, values: &[String], profile: &Profile) -> Result<String> {
    let spec = resolve_spec(sort, profile)?
        .context("no sort given: pass --sort or use a profile with one")?;

    let mut cursor = CursorData::new();
    for arg in values {
        let (field, value) = parse_value_arg(arg)?;
        cursor = cursor.field(field, value);
    }

    let token = encode_token(&cursor, &spec).context("cursor does not match sort")?;
    log!(debug, "token encoded", sort: spec, bytes: token.as_str().len());
    Ok(token.into_string())
}

fn decode(token: &str, sort: Option<&str>, profile: &Profile) -> Result<String> {
    let (spec, cursor) = match resolve_spec(sort, profile)? {
        Some(spec) => {
            let cursor = decode_token(token, &spec).context("invalid continuation token")?;
            (spec, cursor)
        },
        None => match parse_token(token).context("invalid continuation token")? {
            Some(decoded) => (decoded.spec, Some(decoded.cursor)),
            None => return Ok("null".to_string()),
        },
    };
    let Some(cursor) = cursor else {
        return Ok("null".to_string());
    };

    let keys: Vec<serde_json::Value> = spec
        .keys()
        .iter()
        .map(|key| {
            let value = cursor.get(&key.field).unwrap_or(&Value::Null);
            json!({
                "field": key.field,
                "dir": match key.dir {
                    SortDir::Asc => "asc",
                    SortDir::Desc => "desc",
                },
                "nullable": key.nullable,
                "kind": value.kind(),
                "value": value,
            })
        })
        .collect();

    log!(debug, "token decoded", sort: spec, keys: keys.len());
    let out = json!({ "sort": spec.to_string(), "keys": keys });
    Ok(serde_json::to_string_pretty(&out)?)
}

struct QueryRequest<'a> {
    table: &'a str,
    spec: &'a SortSpec,
    fields: &'a [String],
    cursor: Option<CursorData>,
    size: PageSize,
}

fn query<D: Dialect>(dialect: D, request: QueryRequest<'_>) -> Result<String> {
    let fields: Vec<&str> = request.fields.iter().map(String::as_str).collect();
    let first_page = request.cursor.is_none();

    let mut builder = PageQuery::new(dialect, request.table, request.spec);
    if !fields.is_empty() {
        builder = builder.fields(&fields);
    }
    let result = builder
        .cursor(request.cursor)
        .page_size(request.size)
        .build()
        .context("failed to build page query")?;

    log!(
        info,
        "page query built",
        dialect: dialect.name(),
        table: request.table,
        sort: request.spec,
        limit: request.size,
        first_page: first_page,
        params: result.params.len(),
    );
    Ok(serde_json::to_string_pretty(&result)?)
}

/// Parse `FIELD=KIND:TEXT` or `FIELD=null` into a cursor entry.
///
/// Kinds: `bool`, `int`, `dec`, `ts` (RFC 3339) and `text`.
pub fn parse_value_arg(arg: &str) -> Result<(String, Value)> {
    let Some((field, rest)) = arg.split_once('=') else {
        bail!("invalid value '{arg}': expected FIELD=KIND:TEXT");
    };
    if field.is_empty() {
        bail!("invalid value '{arg}': empty field name");
    }
    if rest == "null" {
        return Ok((field.to_string(), Value::Null));
    }
    let Some((kind, text)) = rest.split_once(':') else {
        bail!("invalid value '{arg}': expected FIELD=KIND:TEXT");
    };

    let value = match kind {
        "bool" => Value::Bool(
            text.parse()
                .with_context(|| format!("invalid bool for '{field}'"))?,
        ),
        "int" => Value::Int(
            text.parse()
                .with_context(|| format!("invalid int for '{field}'"))?,
        ),
        "dec" => Value::Decimal(
            text.parse::<Decimal>()
                .with_context(|| format!("invalid decimal for '{field}'"))?,
        ),
        "ts" => Value::Timestamp(
            DateTime::parse_from_rfc3339(text)
                .with_context(|| format!("invalid timestamp for '{field}'"))?
                .with_timezone(&Utc),
        ),
        "text" => Value::Text(text.to_string()),
        other => bail!("unknown kind '{other}' for '{field}' (bool, int, dec, ts, text)"),
    };
    Ok((field.to_string(), value))
}
