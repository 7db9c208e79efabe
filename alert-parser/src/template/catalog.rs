use super::TemplateDef;

/// Built-in alert templates, in match order
///
/// Patterns are compiled case-insensitive, `.` matching newlines.
/// Specific templates come before the catch-all ones that share their account pattern.
pub const BUILTIN_TEMPLATES: &[TemplateDef] = &[
    TemplateDef::new("Huntington Checking/Savings")
        .account(r"CK(\d{4})")
        .amount(r"for \$(\d{1,3}(?:,\d{3})*(?:\.\d{2})?)\b(?: at|$)")
        .vendor(r" at (.*?) from")
        .date(r"as of (\d{1,2}/\d{1,2}/\d{2}\s+\d{1,2}:\d{2}\s+(?:AM|PM)\s+ET)"),
    TemplateDef::new("Target Credit Card")
        .account(r"ending in (\d{4})")
        .amount(r"transaction of \$(\d{1,3}(?:,\d{3})*(?:\.\d+)?) at")
        .vendor(r"\sat\s(.*?)\s+was"),
    TemplateDef::new("US Bank - Credit Card")
        .account(r"card ending in (\d{4})")
        .amount(r"charged \$([\d,]+(?:\.\d{2})?)\s+at")
        .vendor(r"\bat (.*?)\. A"),
    TemplateDef::new("Chase Payment Sent")
        .account(r"Account ending in[^(]*\(\.\.\.(\d{4})\)")
        .amount(r"You sent \$(\d+(?:,\d{3})*(?:\.\d{2})?)")
        .vendor(
            r"(?:You sent \$[\d,.]+\s+to\s+|Recipient</td>\s*<td[^>]*>)([^<\r\n]+?)(?:\s+(?:on|from|account|sent)\b|\.(?:\s|$)|[<\r\n]|$)",
        )
        .date(r"Sent on\s*\r?\n\s*([^\r\n<]+)")
        .subject(r"You sent \$[\d,.]+.*account ending in"),
    TemplateDef::new("Discover Credit Card")
        .account(r"Last 4 #:(?:&nbsp;|\s)*(\d{4})")
        .amount(r"\$([\d,]+(?:\.\d{2})?)\s*<br\s*/?>")
        .vendor(r"Merchant: (.*?)<br\s*/?>")
        .date(r"Date: (.*?)<br\s*/?>"),
    TemplateDef::new("Discover Transaction Alert")
        .account(r"Account ending in\s+(\d{4})")
        .amount(r"Amount: \$(\d+(?:,\d{3})*(?:\.\d{2})?)")
        .merchant_label(r"Merchant:\s+([^\r\n<]+)")
        .date(r"Transaction Date:+\s*([^\r\n<]+?)(?:\s+[A-Z][A-Za-z ]{0,30}:|[\r\n<]|$)"),
    TemplateDef::new("Chase Direct Deposit")
        .account(r"Account ending in[^(]*\(\.\.\.(\d{4})\)")
        .amount(r"You have a direct deposit of \$(\d+(?:,\d{3})*(?:\.\d{2})?)")
        .fixed_vendor("Direct Deposit")
        .date(r">([^<]+(?:AM|PM) ET)</td>"),
    TemplateDef::new("Chase Transaction Alert - New1")
        .account(r"(?:Chase [^(<]+\(\.\.\.(\d{4})\)|Account ending in[^<]*\(\.\.\.(\d{4})\))")
        .amount(
            r"(?:You made a \$(\d+(?:,\d{3})*(?:\.\d{2})?) transaction|You have a direct deposit of \$(\d+(?:,\d{3})*(?:\.\d{2})?))",
        )
        .vendor(
            r"transaction with\s+([^<\r\n]+?)(?:\s+(?:on|account|date|merchant|amount|made)\b|\.(?:\s|$)|[<\r\n]|$)",
        )
        .date(r">([^<]+(?:AM|PM) ET)</td>")
        .subject(r"Your \$[\d,.]+.*(?:transaction with|direct deposit)")
        .subject_vendor(r"transaction with\s+([^<\r\n]+)"),
    TemplateDef::new("Chase Test Format")
        .account(r"card ending in (\d+)")
        .amount(r"\$([0-9,.]+)")
        .vendor(r"made at (.+?) using"),
    TemplateDef::new("Chase Sapphire Preferred")
        .account(r"(?:Chase [^(<]+\(\.\.\.(\d{4})\)|Account ending in[^<]*\(\.\.\.(\d{4})\))")
        .amount(
            r"(?:You made a \$(\d+(?:,\d{3})*(?:\.\d{2})?) transaction|You have a direct deposit of \$(\d+(?:,\d{3})*(?:\.\d{2})?))",
        )
        .merchant_label(r"Merchant:\s*([^<\r\n]+)")
        .date(r"(?:Date</td>.*?<td[^>]*>([^<]+)</td>)|(?:>([^<]+(?:AM|PM) ET)</td>)"),
    TemplateDef::new("Chase External Transfer")
        .account(r"ending in (\d+)")
        .amount(r"A \$([\d,]+(?:\.\d{2})?) external")
        .vendor(r"\bto (.*?) on\b"),
    TemplateDef::new("Chase Debit Card")
        .account(r"ending in (\d+)")
        .amount(r"A \$([\d,]+(?:\.\d{2})?) debit")
        .vendor(r"\bto (.*?) on\b"),
    TemplateDef::new("Chase Checking Acct - Bill Pay")
        .account(r"ending in (\d+)")
        .amount(r"\$([\d,]+(?:\.\d{2})?) payment to")
        .vendor(r"payment to ([^.]+?) on\b")
        .date(r"\bon ([^.]+?) executed"),
    TemplateDef::new("Chase Credit Cards - HTML Template").iterate(),
    TemplateDef::new("Chase Credit Cards - ??")
        .account(r"ending in (\d+)")
        .amount(r"charge of \(\$[^)]*\) \$?([\d,]+(?:\.\d{2})?) at ")
        .vendor(r"\bat (.*?) has\b"),
    TemplateDef::new("Capital One Credit Card")
        .account(r"Account ending in (\d{4})")
        .amount(r"\$([\d,]+(?:\.\d{2})?) was ")
        .vendor(r" at (.*?), a"),
    TemplateDef::new("Huntington Checking/Savings Deposit")
        .account(r"CK(\d{4})")
        .amount(r"for \$([\d,]+(?:\.\d{2})?)")
        .vendor(r" from (.*?) to\b"),
    TemplateDef::new("Huntington Checking/Savings Deposit2")
        .account(r"CK(\d{4})")
        .amount(r"for \$([\d,]+(?:\.\d{2})?)")
        .vendor(r" at (.*?) from"),
    TemplateDef::new("Chase Payment Alert")
        .account(r"Account ending in[^(]*\(\.\.\.(\d{4})\)")
        .amount(r"\$(\d+(?:,\d{3})*(?:\.\d{2})?)")
        .vendor(
            r"You sent \$[\d,.]+\s+to\s+([^<\r\n]+?)(?:\s+(?:on|from|account|sent)\b|\.(?:\s|$)|[<\r\n]|$)",
        )
        .date(r"Sent on\s+([^<\r\n]+)"),
];
