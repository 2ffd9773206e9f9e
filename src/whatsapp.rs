//! WhatsApp click-to-chat links with prefilled inquiry messages

use crate::models::Product;

const GREETING_LINE: &str = "Hello NEXLYN Distributions,";

/// Number of spec lines quoted in a product inquiry
const QUOTED_SPECS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryContext<'a> {
    General,
    Product(&'a Product),
    Category(&'a str),
    Reseller,
}

impl InquiryContext<'_> {
    pub fn message(&self) -> String {
        match self {
            InquiryContext::General => format!(
                "{GREETING_LINE}\n\n\
                 I’m interested in MikroTik® products for business/enterprise deployment.\n\n\
                 *Please provide information about:*\n\
                 • Product catalog & specifications\n\
                 • Pricing for business/volume orders\n\
                 • Technical consultation services\n\
                 • Training & certification programs\n\
                 • Export capabilities & documentation\n\n\
                 *Business details:*\n\
                 • Company: [Your company name]\n\
                 • Location: [Country/Region]\n\n\
                 Thank you!"
            ),
            InquiryContext::Product(product) => {
                let specs = product
                    .specs
                    .iter()
                    .take(QUOTED_SPECS)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("\n• ");
                format!(
                    "{GREETING_LINE}\n\n\
                     I’m interested in the *{}* ({}) for business deployment.\n\n\
                     *Product Details:*\n\
                     • {}\n\n\
                     *Please provide:*\n\
                     • Reseller/volume pricing tiers\n\
                     • Current stock availability\n\
                     • Lead time for export orders\n\
                     • Technical documentation\n\
                     • Warranty & RMA process\n\n\
                     *Company/Business:* [Your company name]\n\
                     *Estimated quantity:* [Quantity needed]\n\
                     *Delivery location:* [Country/Region]\n\n\
                     Thank you!",
                    product.name, product.code, specs
                )
            }
            InquiryContext::Category(category) => format!(
                "{GREETING_LINE}\n\n\
                 I’m interested in your *{category}* products for business deployment.\n\n\
                 *Please provide:*\n\
                 • Product comparison & specifications\n\
                 • Volume pricing structure\n\
                 • Stock availability across range\n\
                 • Recommended solutions for my use case\n\n\
                 *Business details:*\n\
                 • Company: [Your company name]\n\
                 • Location: [Country/Region]\n\n\
                 Thank you!"
            ),
            InquiryContext::Reseller => format!(
                "{GREETING_LINE}\n\n\
                 I’m interested in becoming an *authorized MikroTik® reseller* in your territory.\n\n\
                 *Business Information:*\n\
                 • Company name: [Your company]\n\
                 • Territory: [City/Region]\n\n\
                 *I would like information about:*\n\
                 • Reseller program requirements\n\
                 • Volume pricing tiers\n\
                 • Technical training opportunities\n\
                 • Marketing support available\n\
                 • RMA & warranty procedures\n\n\
                 Thank you!"
            ),
        }
    }
}

/// `wa.me` only accepts the bare international number.
fn digits(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

/// Chat link without a prefilled message.
pub fn chat_link(number: &str) -> String {
    format!("https://wa.me/{}", digits(number))
}

pub fn deep_link(number: &str, context: InquiryContext<'_>) -> String {
    format!(
        "{}?text={}",
        chat_link(number),
        urlencoding::encode(&context.message())
    )
}
