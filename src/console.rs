//! Line-oriented console host over the command layer.
//!
//! One command per line; `help` lists them. Errors are printed and the loop
//! keeps going, only `quit` or end of input stops it.

use crate::ai::{CredentialManager, ProviderKind};
use crate::commands::{self, AppState, ChatReply, StatementView};
use crate::extraction::FileBlob;
use crate::models::EditableField;
use crate::reconcile::format_vnd;
use crate::speech::TranscriptInput;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const HELP: &str = "\
files <path>...              chọn tệp sao kê
extract                      trích xuất nội dung
process                      phân tích thành sổ cái
show                         hiển thị sổ cái
set <dòng> <cột> <giá trị>   sửa một ô (debit, credit, fee, vat, date, description, code)
opening <số tiền>            sửa số dư đầu kỳ
undo                         hoàn tác
say <dòng> <cột> <câu nói>   nhập bằng giọng nói
chat <tin nhắn>              hỏi trợ lý
chat-image <path> <tin nhắn> hỏi trợ lý kèm ảnh
yes | no                     xác nhận hoặc huỷ thay đổi đang chờ
key <deepseek|gemini> <key>  lưu API key vào keychain
forget <deepseek|gemini>     xoá API key khỏi keychain
keys                         xem nhà cung cấp đã có key
quit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    Files(Vec<PathBuf>),
    Extract,
    Process,
    Show,
    Set {
        row: usize,
        field: String,
        value: String,
    },
    Opening(String),
    Undo,
    Say {
        row: usize,
        field: EditableField,
        transcript: String,
    },
    Chat(String),
    ChatImage {
        path: PathBuf,
        message: String,
    },
    Confirm,
    Reject,
    Key {
        provider: ProviderKind,
        key: String,
    },
    Forget(ProviderKind),
    Keys,
    Quit,
}

impl ConsoleCommand {
    /// Parse one line. Rows are 1-based as shown by `show`.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb {
            "help" | "?" => Self::Help,
            "files" => {
                let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if paths.is_empty() {
                    return Err("Cần ít nhất một đường dẫn".to_string());
                }
                Self::Files(paths)
            }
            "extract" => Self::Extract,
            "process" => Self::Process,
            "show" => Self::Show,
            "set" => {
                let (row, rest) = split_row(rest)?;
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f.to_string(), v.trim().to_string()))
                    .unwrap_or_else(|| (rest.to_string(), String::new()));
                if field.is_empty() {
                    return Err("Thiếu tên cột".to_string());
                }
                Self::Set { row, field, value }
            }
            "opening" => Self::Opening(rest.to_string()),
            "undo" => Self::Undo,
            "say" => {
                let (row, rest) = split_row(rest)?;
                let (field, transcript) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "Thiếu câu nói".to_string())?;
                let field: EditableField = field.parse().map_err(|e| format!("{}", e))?;
                Self::Say {
                    row,
                    field,
                    transcript: transcript.trim().to_string(),
                }
            }
            "chat" if !rest.is_empty() => Self::Chat(rest.to_string()),
            "chat-image" => {
                let (path, message) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "Cần đường dẫn ảnh và tin nhắn".to_string())?;
                Self::ChatImage {
                    path: PathBuf::from(path),
                    message: message.trim().to_string(),
                }
            }
            "yes" | "y" => Self::Confirm,
            "no" | "n" => Self::Reject,
            "key" => {
                let (provider, key) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "Cần tên nhà cung cấp và key".to_string())?;
                Self::Key {
                    provider: parse_provider(provider)?,
                    key: key.trim().to_string(),
                }
            }
            "forget" => Self::Forget(parse_provider(rest)?),
            "keys" => Self::Keys,
            "quit" | "exit" => Self::Quit,
            _ => return Err(format!("Lệnh không hợp lệ: '{}'. Gõ 'help'.", line)),
        };
        Ok(command)
    }
}

fn parse_provider(name: &str) -> Result<ProviderKind, String> {
    match name {
        "deepseek" => Ok(ProviderKind::DeepSeek),
        "gemini" => Ok(ProviderKind::Gemini),
        other => Err(format!("Không rõ nhà cung cấp '{}'", other)),
    }
}

fn split_row(rest: &str) -> Result<(usize, &str), String> {
    let (row, tail) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));
    match row.parse::<usize>() {
        Ok(n) if n >= 1 => Ok((n - 1, tail.trim())),
        _ => Err(format!("'{}' không phải số dòng hợp lệ", row)),
    }
}

/// Render the ledger as a plain-text table
pub fn render_view(view: &StatementView) -> String {
    let mut out = String::new();
    let info = &view.report.account_info;
    if let Some(name) = &info.account_name {
        out.push_str(&format!("Chủ tài khoản: {}\n", name));
    }
    if let Some(number) = &info.account_number {
        out.push_str(&format!("Số tài khoản: {}\n", number));
    }
    if let Some(bank) = &info.bank_name {
        out.push_str(&format!("Ngân hàng: {}\n", bank));
    }

    out.push_str(&format!("Số dư đầu kỳ: {}\n", format_vnd(view.opening_balance)));
    out.push_str(&format!(
        "{:>4}  {:<10}  {:<12}  {:<32}  {:>14}  {:>14}  {:>10}  {:>10}  {:>16}\n",
        "#", "Ngày", "Mã GD", "Diễn giải", "Nợ", "Có", "Phí", "VAT", "Số dư"
    ));
    for row in &view.rows {
        let tx = &row.transaction;
        out.push_str(&format!(
            "{:>4}  {:<10}  {:<12}  {:<32}  {:>14}  {:>14}  {:>10}  {:>10}  {:>16}\n",
            row.index + 1,
            tx.date,
            tx.transaction_code.as_deref().unwrap_or(""),
            truncate(&tx.description, 32),
            format_vnd(tx.debit),
            format_vnd(tx.credit),
            format_vnd(tx.fee),
            format_vnd(tx.vat),
            format_vnd(row.running_balance),
        ));
    }

    let totals = &view.totals;
    out.push_str(&format!(
        "Tổng: Nợ {} | Có {} | Phí {} | VAT {}\n",
        format_vnd(totals.total_debit),
        format_vnd(totals.total_credit),
        format_vnd(totals.total_fee),
        format_vnd(totals.total_vat),
    ));
    out.push_str(&format!(
        "Số dư cuối kỳ: {}",
        format_vnd(totals.computed_ending_balance)
    ));
    if let Some(warning) = &view.mismatch_warning {
        out.push_str(&format!("\n⚠ {}", warning));
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn render_reply(reply: &ChatReply) -> String {
    let mut out = format!("Trợ lý: {}", reply.response_text);
    if reply.awaiting_confirmation {
        out.push_str("\n(yes để áp dụng, no để huỷ)");
    }
    if reply.undone == Some(false) {
        out.push_str("\n(không còn gì để hoàn tác)");
    }
    out
}

/// Run one command. `Ok(None)` means stop.
pub async fn execute(state: &AppState, command: ConsoleCommand) -> Result<Option<String>, String> {
    let output = match command {
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Files(paths) => {
            let label = commands::select_paths(state, paths).await?;
            format!("Đã chọn: {}", label)
        }
        ConsoleCommand::Extract => {
            let content = commands::extract_content(state).await?;
            format!("Đã trích xuất {} ký tự", content.chars().count())
        }
        ConsoleCommand::Process => render_view(&commands::process_statement(state).await?),
        ConsoleCommand::Show => match commands::get_statement_view(state).await {
            Some(view) => render_view(&view),
            None => "Chưa có sổ cái. Chạy 'process' trước.".to_string(),
        },
        ConsoleCommand::Set { row, field, value } => {
            render_view(&commands::update_transaction(state, row, &field, &value).await?)
        }
        ConsoleCommand::Opening(raw) => {
            render_view(&commands::set_opening_balance(state, &raw).await?)
        }
        ConsoleCommand::Undo => {
            if commands::undo_last_change(state).await {
                match commands::get_statement_view(state).await {
                    Some(view) => render_view(&view),
                    None => "Đã hoàn tác".to_string(),
                }
            } else {
                "Không còn gì để hoàn tác".to_string()
            }
        }
        ConsoleCommand::Say {
            row,
            field,
            transcript,
        } => {
            let input = TranscriptInput(transcript);
            if commands::apply_speech(state, row, field, &input).await? {
                match commands::get_statement_view(state).await {
                    Some(view) => render_view(&view),
                    None => "Đã cập nhật".to_string(),
                }
            } else {
                "Không nhận ra số tiền".to_string()
            }
        }
        ConsoleCommand::Chat(message) => {
            render_reply(&commands::send_chat_message(state, message, None).await?)
        }
        ConsoleCommand::ChatImage { path, message } => {
            let image = FileBlob::from_path(&path).await.map_err(|e| e.to_string())?;
            render_reply(&commands::send_chat_message(state, message, Some(image)).await?)
        }
        ConsoleCommand::Confirm => render_view(&commands::confirm_pending_mutation(state).await?),
        ConsoleCommand::Reject => {
            if commands::reject_pending_mutation(state).await {
                "Đã huỷ thay đổi".to_string()
            } else {
                "Không có thay đổi nào đang chờ".to_string()
            }
        }
        ConsoleCommand::Key { provider, key } => {
            CredentialManager::store_api_key(provider, &key).map_err(|e| e.to_string())?;
            format!(
                "Đã lưu key {}. Khởi động lại để áp dụng.",
                provider.display_name()
            )
        }
        ConsoleCommand::Forget(provider) => {
            CredentialManager::delete_api_key(provider).map_err(|e| e.to_string())?;
            format!("Đã xoá key {}", provider.display_name())
        }
        ConsoleCommand::Keys => [ProviderKind::DeepSeek, ProviderKind::Gemini]
            .iter()
            .map(|p| {
                let status = if CredentialManager::has_api_key(*p) { "có" } else { "chưa có" };
                format!("{}: {}", p.display_name(), status)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ConsoleCommand::Quit => return Ok(None),
    };
    Ok(Some(output))
}

/// Read commands from stdin until `quit` or EOF
pub async fn run_console(state: AppState) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout
        .write_all(b"Sao ke -> so cai. Go 'help' de xem lenh.\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            continue;
        }

        let output = match ConsoleCommand::parse(&line) {
            Ok(command) => match execute(&state, command).await {
                Ok(Some(text)) => text,
                Ok(None) => break,
                Err(e) => format!("Lỗi: {}", e),
            },
            Err(e) => e,
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;
    }

    tracing::info!("[Console] Session ended");
    Ok(())
}
