use super::provider::CompletionMessage;
use crate::chat::ChatMessage;
use crate::models::StatementReport;

/// OCR prompt for page images (Gemini, temperature 0)
pub const OCR_PROMPT: &str = r#"Bạn là công cụ OCR chuyên cho chứng từ tài chính. Nhiệm vụ: đọc và chép lại toàn bộ văn bản trên các trang sao kê ngân hàng đính kèm.

QUY TẮC:
1. Giữ nguyên mọi con số cùng dấu phân cách (chấm, phẩy) đúng như trên ảnh.
2. Không được bỏ sót chữ số 0 nào (3,000,000 là ba triệu, không phải ba trăm nghìn).
3. Chỉ trả về văn bản thô theo thứ tự đọc, không markdown, không lời dẫn, không giải thích."#;

/// Ledger schema and accounting rules shared by both analysis paths
const LEDGER_RULES: &str = r#"QUY TẮC NGHIỆP VỤ (BẮT BUỘC):
1. Tách phí và thuế: nếu một dòng giao dịch có phí hoặc VAT đi kèm, tách chúng khỏi số tiền gốc.
   - Ví dụ: chuyển đi 10.000.000, kèm phí 11.000 (gồm 10.000 phí + 1.000 VAT).
   - Kết quả: { "debit": 0, "credit": 10000000, "fee": 10000, "vat": 1000 }
2. Định dạng số: hiểu đúng dấu phân cách nghìn và thập phân theo chuẩn Việt Nam; trả về số thuần, không chuỗi.
3. Đảo chiều Nợ/Có:
   - Sao kê ghi "C" (ghi Có, tiền vào tài khoản) -> sổ cái ghi vào `debit`.
   - Sao kê ghi "D" (ghi Nợ, tiền ra khỏi tài khoản) -> sổ cái ghi vào `credit` (chỉ số tiền gốc).
4. Chính xác tuyệt đối: không làm tròn, không bỏ sót chữ số 0, không bịa giao dịch.
5. Số dư đầu kỳ và cuối kỳ: tìm kỹ trong văn bản; nếu không có, đặt 0."#;

/// System prompt for statement analysis (DeepSeek, JSON-object mode)
pub fn build_analysis_system_prompt() -> String {
    format!(
        r#"Bạn là kế toán viên cao cấp. Nhiệm vụ: chuyển văn bản sao kê ngân hàng thô thành sổ cái có cấu trúc JSON.

CẤU TRÚC JSON BẮT BUỘC:
{{
    "openingBalance": number,
    "endingBalance": number,
    "accountInfo": {{
        "accountName": string,
        "accountNumber": string,
        "bankName": string,
        "branch": string
    }},
    "transactions": [
        {{
            "transactionCode": string,
            "date": string,        // DD/MM/YYYY
            "description": string,
            "debit": number,       // tiền vào
            "credit": number,      // tiền ra gốc, KHÔNG gồm phí/thuế
            "fee": number,         // phí tách riêng
            "vat": number          // thuế tách riêng
        }}
    ]
}}

{}

Chỉ trả về đúng một đối tượng JSON, không markdown."#,
        LEDGER_RULES
    )
}

/// User turn for statement analysis
pub fn build_analysis_user_prompt(statement_text: &str) -> String {
    format!(
        "Phân tích nội dung sao kê sau và trả về JSON:\n\n{}",
        statement_text
    )
}

/// Single-turn prompt for the schema-constrained analysis fallback (Gemini)
pub fn build_analysis_fallback_prompt(statement_text: &str) -> String {
    format!(
        r#"Bạn là kế toán viên cao cấp. Chuyển văn bản sao kê ngân hàng dưới đây thành sổ cái theo đúng response schema đã cung cấp.

{}

VĂN BẢN SAO KÊ:
---
{}
---"#,
        LEDGER_RULES, statement_text
    )
}

/// Reply used when neither provider produced a usable chat directive
pub const CHAT_UNAVAILABLE_REPLY: &str =
    "Trợ lý đang bận, Anh/Chị vui lòng thử lại sau ít phút nhé.";

/// System prompt for the chat assistant, with the current ledger embedded
pub fn build_chat_system_prompt(report: &StatementReport) -> String {
    let report_json = serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"Bạn là trợ lý kế toán. Xưng "Em", gọi người dùng là "Anh/Chị".

Luôn trả về JSON theo schema sau (KHÔNG trả về văn bản thường):
{{
    "responseText": string,
    "action": "update" | "undo" | "add" | "query",
    "update": {{ "index": number, "field": "debit" | "credit" | "fee" | "vat", "newValue": number }} | null,
    "add": {{ "transactionCode": string, "date": string, "description": string, "debit": number, "credit": number, "fee": number, "vat": number }} | null,
    "confirmationRequired": boolean
}}

QUY TẮC:
1. Muốn sửa một số tiền -> action="update", điền "update" (index tính từ 0 theo mảng transactions), confirmationRequired=true.
2. Muốn thêm giao dịch -> action="add", điền "add", confirmationRequired=true.
3. Muốn hoàn tác thay đổi gần nhất -> action="undo", confirmationRequired=false.
4. Chỉ hỏi thông tin -> action="query", update=null, add=null, confirmationRequired=false.
5. "responseText" mô tả ngắn gọn thay đổi sẽ thực hiện hoặc trả lời câu hỏi.

Dữ liệu sổ cái hiện tại: {}"#,
        report_json
    )
}

/// Chat-completions transcript: system, history, then the new user turn
pub fn build_chat_messages(
    report: &StatementReport,
    history: &[ChatMessage],
    message: &str,
) -> Vec<CompletionMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(CompletionMessage::system(build_chat_system_prompt(report)));
    messages.extend(history.iter().map(ChatMessage::to_completion_message));
    messages.push(CompletionMessage::user(message));
    messages
}

/// Single-turn chat prompt for the generation provider
pub fn build_chat_fallback_prompt(
    report: &StatementReport,
    history: &[ChatMessage],
    message: &str,
) -> String {
    let mut prompt = build_chat_system_prompt(report);

    if !history.is_empty() {
        prompt.push_str("\n\nLỊCH SỬ HỘI THOẠI:\n");
        for turn in history {
            prompt.push_str(&format!("{}: {}\n", turn.role.label(), turn.content));
        }
    }

    prompt.push_str(&format!("\nTIN NHẮN MỚI CỦA NGƯỜI DÙNG:\n{}", message));
    prompt
}
