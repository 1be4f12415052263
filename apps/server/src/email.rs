//! Invoice email delivery over SMTP.
//!
//! Strictly a post-commit side effect: the checkout handler attempts one
//! send after the sale transaction is durable, logs any failure, and
//! reports it as `email_sent: false`. Nothing here can fail a sale.

use anyhow::{anyhow, Context};
use lettre::message::header::ContentType;
use lettre::message::{MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use tracing::info;

use crate::config::SmtpConfig;
use minimart_core::Sale;
use minimart_db::repository::sale::SaleItemDetail;

/// SMTP mailer for invoice receipts.
#[derive(Clone)]
pub struct Mailer {
    transport: SmtpTransport,
    from_address: String,
    store_name: String,
}

/// Everything the invoice template needs.
pub struct Invoice<'a> {
    pub sale: &'a Sale,
    pub items: &'a [SaleItemDetail],
    pub cashier_name: &'a str,
}

impl Mailer {
    /// Builds a relay transport from config.
    pub fn from_config(smtp: &SmtpConfig, store_name: &str) -> anyhow::Result<Self> {
        let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());

        let transport = SmtpTransport::relay(&smtp.host)
            .context("invalid SMTP host")?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        info!(host = %smtp.host, "Invoice mailer initialized");

        Ok(Mailer {
            transport,
            from_address: smtp.from_address.clone(),
            store_name: store_name.to_string(),
        })
    }

    /// Sends one invoice email. Runs the blocking SMTP call on the blocking
    /// thread pool.
    pub async fn send_invoice(&self, to: &str, invoice: &Invoice<'_>) -> anyhow::Result<()> {
        let subject = format!(
            "{} - Invoice {}",
            self.store_name, invoice.sale.invoice_number
        );

        let email = Message::builder()
            .from(self.from_address.parse().context("invalid from address")?)
            .to(to.parse().context("invalid recipient address")?)
            .subject(&subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(render_plain(&self.store_name, invoice)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(render_html(&self.store_name, invoice)),
                    ),
            )
            .map_err(|e| anyhow!("failed to build email: {e}"))?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .context("email task panicked")?
            .context("SMTP send failed")?;

        info!(to = %to, invoice = %invoice.sale.invoice_number, "Invoice email sent");
        Ok(())
    }
}

fn render_plain(store_name: &str, invoice: &Invoice<'_>) -> String {
    let sale = invoice.sale;
    let mut body = format!(
        "{store_name}\nInvoice {}\nCashier: {}\nDate: {}\n\n",
        sale.invoice_number,
        invoice.cashier_name,
        sale.created_at.format("%Y-%m-%d %H:%M"),
    );

    for item in invoice.items {
        let name = item.product_name.as_deref().unwrap_or("(removed product)");
        body.push_str(&format!(
            "  {name} x{} @ {} = {}\n",
            item.item.quantity, item.item.unit_price, item.item.total_price
        ));
    }

    body.push_str(&format!(
        "\nSubtotal: {}\nDiscount: {}\nTotal: {}\nCash received: {}\nChange: {}\n\nThank you for shopping with us!\n",
        sale.subtotal, sale.discount_amount, sale.total_amount, sale.cash_received, sale.change_amount
    ));
    body
}

fn render_html(store_name: &str, invoice: &Invoice<'_>) -> String {
    let sale = invoice.sale;

    let rows: String = invoice
        .items
        .iter()
        .map(|item| {
            let name = item.product_name.as_deref().unwrap_or("(removed product)");
            format!(
                "<tr><td>{name}</td><td align=\"center\">{}</td>\
                 <td align=\"right\">{}</td><td align=\"right\">{}</td></tr>",
                item.item.quantity, item.item.unit_price, item.item.total_price
            )
        })
        .collect();

    format!(
        r#"<html><body style="font-family: Arial, sans-serif; color: #333;">
<h1>{store_name}</h1>
<p>Invoice <strong>{invoice_number}</strong><br/>
Cashier: {cashier}<br/>
Date: {date}</p>
<table width="100%" cellpadding="6" style="border-collapse: collapse;">
<tr style="border-bottom: 2px solid #333;">
<th align="left">Product</th><th>Qty</th><th align="right">Unit price</th><th align="right">Total</th>
</tr>
{rows}
</table>
<p align="right">
Subtotal: {subtotal}<br/>
Discount: {discount}<br/>
<strong>Total: {total}</strong><br/>
Cash received: {cash}<br/>
Change: {change}
</p>
<p>Thank you for shopping with us!</p>
</body></html>"#,
        store_name = store_name,
        invoice_number = sale.invoice_number,
        cashier = invoice.cashier_name,
        date = sale.created_at.format("%Y-%m-%d %H:%M"),
        rows = rows,
        subtotal = sale.subtotal,
        discount = sale.discount_amount,
        total = sale.total_amount,
        cash = sale.cash_received,
        change = sale.change_amount,
    )
}
