use alert_parser::{
    AcceptancePolicy, DateTimeResolver, Engine, EngineConfig, Header, MessagePart, ParsedTransaction, RawMessage,
    TemplateCatalog,
    model::{BodyData, PartBody},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono_tz::Tz;

fn message(mime: &str, subject: Option<&str>, date: &str, body: &str) -> RawMessage {
    let mut headers = vec![
        Header::new("From", "Alerts <alerts@bank.example>"),
        Header::new("Date", date),
    ];
    if let Some(subject) = subject {
        headers.push(Header::new("Subject", subject));
    }

    RawMessage {
        id: Some("api-selection".into()),
        message_id: None,
        internal_date: None,
        payload: MessagePart {
            mime_type: "multipart/alternative".into(),
            headers,
            body: None,
            parts: vec![MessagePart {
                mime_type: mime.into(),
                body: Some(PartBody {
                    size: Some(body.len() as u64),
                    data: Some(BodyData::Text(URL_SAFE_NO_PAD.encode(body))),
                }),
                ..Default::default()
            }],
        },
    }
}

fn plain(subject: Option<&str>, date: &str, body: &str) -> RawMessage {
    message("text/plain", subject, date, body)
}

fn html(subject: Option<&str>, date: &str, body: &str) -> RawMessage {
    message("text/html", subject, date, body)
}

fn parse(policy: AcceptancePolicy, msg: &RawMessage) -> Option<ParsedTransaction> {
    Engine::new()
        .with_resolver(DateTimeResolver::with_zone(Tz::UTC))
        .with_config(EngineConfig::default().with_acceptance(policy))
        .parse_message(msg)
}

fn lenient(msg: &RawMessage) -> ParsedTransaction {
    parse(AcceptancePolicy::AnyIdentifier, msg).expect("lenient policy should match")
}

fn strict(msg: &RawMessage) -> ParsedTransaction {
    parse(AcceptancePolicy::AllFields, msg).expect("strict policy should match")
}

#[test]
fn payment_sent_needs_its_subject() {
    let body = "You sent $50.00 to John Smith\nAccount ending in (...1234)\nSent on\nJan 2, 2025 at 6:33 AM ET\n";
    let msg = plain(
        Some("You sent $50.00 to John Smith from account ending in 1234"),
        "Thu, 2 Jan 2025 12:00:00 +0000",
        body,
    );

    // the date sits on its own line, which only the raw body keeps
    for tx in [lenient(&msg), strict(&msg)] {
        assert_eq!(tx.template_used, "Chase Payment Sent");
        assert_eq!(tx.vendor.as_deref(), Some("John Smith"));
        assert_eq!(tx.account.as_deref(), Some("1234"));
        assert_eq!(tx.amount, 50.0);
        assert_eq!(tx.date, "2025-01-02T11:33:00+00:00");
    }
}

#[test]
fn payment_alert_catches_unsubjected_payments() {
    let body = "You sent $25.00 to Jane Doe\nAccount ending in (...5678)\nSent on Jan 3, 2025 at 8:00 PM ET\n";
    let msg = plain(None, "Sat, 4 Jan 2025 01:05:00 +0000", body);

    for tx in [lenient(&msg), strict(&msg)] {
        assert_eq!(tx.template_used, "Chase Payment Alert");
        assert_eq!(tx.vendor.as_deref(), Some("Jane Doe"));
        assert_eq!(tx.account.as_deref(), Some("5678"));
        assert_eq!(tx.amount, 25.0);
        assert_eq!(tx.date, "2025-01-04T01:00:00+00:00");
    }
}

#[test]
fn discover_labels_are_cut_at_the_next_label() {
    let body = "Transaction Date: Dec 30, 2024\nMerchant: SHELL OIL 12345\nAmount: $41.20\nAccount ending in 9999\n";
    let msg = plain(None, "Mon, 30 Dec 2024 17:07:12 -0500", body);

    for tx in [lenient(&msg), strict(&msg)] {
        assert_eq!(tx.template_used, "Discover Transaction Alert");
        assert_eq!(tx.vendor.as_deref(), Some("SHELL OIL 12345"));
        assert_eq!(tx.account.as_deref(), Some("9999"));
        assert_eq!(tx.amount, 41.2);
        assert_eq!(tx.date, "2024-12-30T22:07:12+00:00");
    }
}

#[test]
fn direct_deposit_has_fixed_vendor() {
    let body = "<table><tr><td>You have a direct deposit of $1,234.56</td></tr>\
                <tr><td>Account ending in (...7890)</td></tr>\
                <tr><td>Jan 2, 2025 at 6:33 AM ET</td></tr></table>";
    let msg = html(None, "Thu, 2 Jan 2025 12:00:00 +0000", body);

    for tx in [lenient(&msg), strict(&msg)] {
        assert_eq!(tx.template_used, "Chase Direct Deposit");
        assert_eq!(tx.vendor.as_deref(), Some("Direct Deposit"));
        assert_eq!(tx.amount, 1234.56);
        assert_eq!(tx.date, "2025-01-02T11:33:00+00:00");
    }
}

#[test]
fn sapphire_reads_merchant_label() {
    let body = "<table><tr><td>You made a $12.00 transaction</td></tr>\
                <tr><td>Account</td><td>Chase Sapphire Preferred (...1234)</td></tr>\
                <tr><td>Date</td><td>Jan 2, 2025 at 6:33 AM ET</td></tr>\
                <tr><td>Merchant: STARBUCKS</td></tr></table>";
    let msg = html(None, "Thu, 2 Jan 2025 12:00:00 +0000", body);

    for tx in [lenient(&msg), strict(&msg)] {
        assert_eq!(tx.template_used, "Chase Sapphire Preferred");
        assert_eq!(tx.vendor.as_deref(), Some("STARBUCKS"));
        assert_eq!(tx.account.as_deref(), Some("1234"));
        assert_eq!(tx.date, "2025-01-02T11:33:00+00:00");
    }
}

#[test]
fn bill_pay_date_gets_envelope_time() {
    let body = "Your $100.00 payment to COMCAST on 01/02/2025 executed successfully \
                from your account ending in 4444.";
    let msg = plain(None, "Thu, 2 Jan 2025 15:00:00 +0000", body);

    for tx in [lenient(&msg), strict(&msg)] {
        assert_eq!(tx.template_used, "Chase Checking Acct - Bill Pay");
        assert_eq!(tx.vendor.as_deref(), Some("COMCAST"));
        assert_eq!(tx.account.as_deref(), Some("4444"));
        assert_eq!(tx.amount, 100.0);
        assert_eq!(tx.date, "2025-01-02T15:00:00+00:00");
    }
}

#[test]
fn bill_pay_without_amount_matches_nothing() {
    let body = "Your payment to COMCAST on 01/02/2025 executed successfully \
                from your account ending in 4444.";
    let msg = plain(None, "Thu, 2 Jan 2025 15:00:00 +0000", body);

    assert_eq!(parse(AcceptancePolicy::AnyIdentifier, &msg), None);
    assert_eq!(parse(AcceptancePolicy::AllFields, &msg), None);
}

#[test]
fn transaction_table_without_headline_falls_to_table_template() {
    let body = "<table>\
                <tr><td>Account</td><td>Chase Sapphire Preferred (...1234)</td></tr>\
                <tr><td>Date</td><td>Jan 2, 2025 at 6:33 AM ET</td></tr>\
                <tr><td>Merchant</td><td>STARBUCKS</td></tr>\
                <tr><td>Amount</td><td>$12.00</td></tr>\
                </table>";
    let msg = html(
        Some("Your $12.00 transaction with STARBUCKS"),
        "Thu, 2 Jan 2025 12:00:00 +0000",
        body,
    );

    let tx = lenient(&msg);

    assert_eq!(tx.template_used, "Chase Credit Cards - HTML Template");
    assert_eq!(tx.vendor.as_deref(), Some("STARBUCKS"));
    assert_eq!(tx.account.as_deref(), Some("1234"));
    assert_eq!(tx.amount, 12.0);
    assert_eq!(tx.date, "2025-01-02T11:33:00+00:00");
}

struct AmountCase {
    template: &'static str,
    policy: AcceptancePolicy,
    subject: Option<&'static str>,
    amount: &'static str,
    body: &'static str,
}

fn winner(policy: AcceptancePolicy, msg: &RawMessage) -> Option<String> {
    Engine::new()
        .with_resolver(DateTimeResolver::with_zone(Tz::UTC))
        .with_config(EngineConfig::default().with_acceptance(policy))
        .analyze(msg)
        .trace
        .winner
}

// Huntington Deposit2 shares account and amount rules with Deposit, so only a
// missing vendor lets it through; it is checked with every field required.
#[test]
fn every_builtin_template_needs_its_amount() {
    let cases = [
        AmountCase {
            template: "Huntington Checking/Savings",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$12.34",
            body: "Huntington: CK1234 had a purchase for $12.34 at STARBUCKS from your account as of 12/30/24 5:07 PM ET.",
        },
        AmountCase {
            template: "Target Credit Card",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$25.00",
            body: "Your Target card ending in 1234: a transaction of $25.00 at TARGET T-1234 was approved.",
        },
        AmountCase {
            template: "US Bank - Credit Card",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$40.00",
            body: "Your card ending in 5678 was charged $40.00 at SHELL OIL. A receipt is available online.",
        },
        AmountCase {
            template: "Chase Payment Sent",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: Some("You sent $50.00 to John Smith from account ending in 1234"),
            amount: "$50.00",
            body: "You sent $50.00 to John Smith\nAccount ending in (...1234)\nSent on\nJan 2, 2025 at 6:33 AM ET\n",
        },
        AmountCase {
            template: "Discover Credit Card",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$45.67",
            body: "Last 4 #: 4321<br>Merchant: AMAZON MKTPLACE<br>$45.67<br>Date: December 30, 2024<br>",
        },
        AmountCase {
            template: "Discover Transaction Alert",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$41.20",
            body: "Transaction Date: Dec 30, 2024\nMerchant: SHELL OIL 12345\nAmount: $41.20\nAccount ending in 9999\n",
        },
        AmountCase {
            template: "Chase Direct Deposit",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$1,234.56",
            body: "<table><tr><td>You have a direct deposit of $1,234.56</td></tr><tr><td>Account ending in (...7890)</td></tr><tr><td>Jan 2, 2025 at 6:33 AM ET</td></tr></table>",
        },
        AmountCase {
            template: "Chase Transaction Alert - New1",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: Some("Your $12.00 transaction with STARBUCKS"),
            amount: "$12.00",
            body: "<table><tr><td>You made a $12.00 transaction with STARBUCKS</td></tr><tr><td>Account</td><td>Chase Sapphire Preferred (...1234)</td></tr><tr><td>Date</td><td>Jan 2, 2025 at 6:33 AM ET</td></tr></table>",
        },
        AmountCase {
            template: "Chase Test Format",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$9.99",
            body: "A charge of $9.99 was made at NETFLIX using your card ending in 4444.",
        },
        AmountCase {
            template: "Chase Sapphire Preferred",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$12.00",
            body: "<table><tr><td>You made a $12.00 transaction</td></tr><tr><td>Account</td><td>Chase Sapphire Preferred (...1234)</td></tr><tr><td>Date</td><td>Jan 2, 2025 at 6:33 AM ET</td></tr><tr><td>Merchant: STARBUCKS</td></tr></table>",
        },
        AmountCase {
            template: "Chase External Transfer",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$500.00",
            body: "A $500.00 external transfer to JOHN DOE on 01/02/2025 was sent from your account ending in 1111.",
        },
        AmountCase {
            template: "Chase Debit Card",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$20.00",
            body: "A $20.00 debit card transaction to STARBUCKS on 01/02/2025 exceeded your alert setting for account ending in 2222.",
        },
        AmountCase {
            template: "Chase Checking Acct - Bill Pay",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$100.00",
            body: "Your $100.00 payment to COMCAST on 01/02/2025 executed successfully from your account ending in 4444.",
        },
        AmountCase {
            template: "Chase Credit Cards - HTML Template",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$12.00",
            body: "<table><tr><td>Account</td><td>Chase Sapphire Preferred (...1234)</td></tr><tr><td>Merchant</td><td>STARBUCKS</td></tr><tr><td>Amount</td><td>$12.00</td></tr></table>",
        },
        AmountCase {
            template: "Chase Credit Cards - ??",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$12.00",
            body: "Your charge of ($12.00) $12.00 at STARBUCKS has posted to your account ending in 3333.",
        },
        AmountCase {
            template: "Capital One Credit Card",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$41.20",
            body: "Your Account ending in 5555: $41.20 was spent at SHELL OIL, a merchant near you.",
        },
        AmountCase {
            template: "Huntington Checking/Savings Deposit",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$100.00",
            body: "CK1234 received a deposit for $100.00 from ACME PAYROLL to your account.",
        },
        AmountCase {
            template: "Huntington Checking/Savings Deposit2",
            policy: AcceptancePolicy::AllFields,
            subject: None,
            amount: "$8.00",
            body: "CK1234 purchase for $8.00 at STARBUCKS from checking.",
        },
        AmountCase {
            template: "Chase Payment Alert",
            policy: AcceptancePolicy::AnyIdentifier,
            subject: None,
            amount: "$25.00",
            body: "You sent $25.00 to Jane Doe\nAccount ending in (...5678)\nSent on Jan 3, 2025 at 8:00 PM ET\n",
        },
    ];

    let catalog = TemplateCatalog::builtin();
    assert_eq!(cases.len(), catalog.len());
    let position = |name: &str| catalog.iter().position(|t| t.name() == name);

    for (i, case) in cases.iter().enumerate() {
        assert_eq!(position(case.template), Some(i), "cases follow catalog order");
        let mime = if case.body.contains('<') { "text/html" } else { "text/plain" };
        let date = "Thu, 2 Jan 2025 12:00:00 +0000";

        let with_amount = message(mime, case.subject, date, case.body);
        assert_eq!(
            winner(case.policy, &with_amount).as_deref(),
            Some(case.template),
            "{} should match its own alert",
            case.template
        );

        let without_amount = message(mime, case.subject, date, &case.body.replace(case.amount, ""));
        if let Some(other) = winner(case.policy, &without_amount) {
            let later = position(&other).is_some_and(|j| j > i);
            assert!(later, "{} without amount fell back to earlier template {other}", case.template);
        }
    }
}
