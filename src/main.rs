mod api;
mod cache;
mod config;
mod display;
mod error;
mod http;
mod lookup;
mod result;
mod sign;
mod yodaodict;

use anyhow::Context;
use clap::{CommandFactory, Parser, ValueEnum};
use console::{style, Term};
use tracing_subscriber::EnvFilter;

use crate::api::ApiFetcher;
use crate::cache::{CacheStore, ListOrder};
use crate::config::Config;
use crate::error::DictError;
use crate::lookup::{normalize_keyword, Lookup};
use crate::yodaodict::WebFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListArg {
    /// 按查询时间
    #[value(name = "t")]
    Time,
    /// 按查询次数
    #[value(name = "c")]
    Count,
    /// 按字母顺序
    #[value(name = "a")]
    Alpha,
}

impl From<ListArg> for ListOrder {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::Time => ListOrder::Insertion,
            ListArg::Count => ListOrder::CountDesc,
            ListArg::Alpha => ListOrder::KeywordAsc,
        }
    }
}

/// 控制台下的 storm-words, 查询结果会保存到 SQLite 数据库中
#[derive(Debug, Parser)]
#[command(name = "sw", disable_version_flag = true)]
struct Cli {
    /// 强制重新获取, 不管数据库中是否已经保存
    #[arg(short, long)]
    force: bool,

    /// 使用有道 API
    #[arg(short, long)]
    api: bool,

    /// 列出数据库中保存的所有单词 (t: 时间, c: 次数, a: 字母)
    #[arg(short, long, value_name = "ORDER", num_args = 0..=1, default_missing_value = "t")]
    list: Option<ListArg>,

    /// 删除数据库中某个单词
    #[arg(short, long, value_name = "WORD")]
    delete: Option<String>,

    /// 清空数据库
    #[arg(short, long)]
    clear: bool,

    /// 清空数据库时不再确认
    #[arg(short, long, requires = "clear")]
    yes: bool,

    /// 输出调试信息
    #[arg(long)]
    debug: bool,

    /// 显示版本
    #[arg(short = 'v', long)]
    version: bool,

    /// 要查询的单词或句子
    words: Vec<String>,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("warn,sw=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if cli.version {
        println!("v{}", config::VERSION);
        return Ok(());
    }

    let config = Config::load().context("preparing ~/.storm_words")?;
    tracing::debug!(
        base_dir = %config.base_dir.display(),
        settings = %config.settings_path.display(),
        version = %config.version,
        "config loaded"
    );
    let store = CacheStore::open(&config.db_path).context("opening word database")?;

    let mut lookup = Lookup::new(&store, Box::new(WebFetcher::new()?));
    if let Some(creds) = &config.credentials {
        lookup = lookup.with_api(Box::new(ApiFetcher::new(
            &creds.app_key,
            &creds.secret_key,
        )?));
    }

    if let Some(order) = cli.list {
        print!("{}", display::render_word_list(&lookup.list(order.into())?));
        return Ok(());
    }

    if let Some(word) = &cli.delete {
        match lookup.forget(word) {
            Ok(deleted) => println!("{}", style(format!("已删除 {deleted}")).blue()),
            Err(DictError::NotFound(word)) => {
                println!("{}", style(format!("没有找到 {word}")).red())
            }
            Err(e) => return Err(e.into()),
        }
        return Ok(());
    }

    if cli.clear {
        if cli.yes || confirm_clear()? {
            let count = lookup.clear()?;
            println!("{}", style(format!("共删除 {count} 个单词")).blue());
        }
        return Ok(());
    }

    let keyword = normalize_keyword(&cli.words);
    if keyword.is_empty() {
        Cli::command().print_help()?;
        return Ok(());
    }

    match lookup.lookup(&keyword, cli.force, cli.api) {
        Ok(result) => {
            print!("{}", display::render_result(&result));
            Ok(())
        }
        Err(DictError::Fetch(e)) if e.is_network_unavailable() => {
            eprintln!("{}", style("网络不可用, 请检查网络连接").red());
            tracing::debug!(error = %e, "fetch failed");
            std::process::exit(1);
        }
        Err(DictError::Fetch(e)) => {
            eprintln!("{}", style(format!("查询失败: {e}")).red());
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn confirm_clear() -> anyhow::Result<bool> {
    let term = Term::stdout();
    term.write_line("clear your database, y or n?")?;
    let answer = term.read_line()?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
