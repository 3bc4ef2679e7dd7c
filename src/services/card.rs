// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fit-test e-card rendering.
//!
//! Produces the complete HTML document that is emailed to the recipient.
//! Rendering is deterministic: the same input yields byte-identical output.
//! Missing fields render as bracketed placeholders so the card layout is
//! always complete, and the QR code is embedded by reference to an external
//! image API rather than inlined.

use crate::models::fit_test::TestResult;
use crate::models::FormDraft;

/// Where the QR code sends recipients who need to reschedule.
pub const RESCHEDULE_URL: &str = "https://next-leap-fit.vercel.app/";

/// Subject line used for both first sends and resends.
pub const CARD_SUBJECT: &str = "Fit Testing Results E-card";

const QR_IMAGE_API: &str = "https://api.qrserver.com/v1/create-qr-code/?size=150x150&data=";

const RESULT_PASS_COLOR: &str = "#28a745";
const RESULT_FAIL_COLOR: &str = "#dc3545";
const RESULT_NEUTRAL_COLOR: &str = "#333";

fn field_or<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

/// Render the fit-test e-card for a draft (or a stored record viewed as one).
pub fn render_fit_test_card(draft: &FormDraft) -> String {
    let qr_image_url = format!("{}{}", QR_IMAGE_API, urlencoding::encode(RESCHEDULE_URL));

    let client_name = field_or(&draft.client_name, "[Client Name]");
    let dob = field_or(&draft.dob, "[Date of Birth]");
    let issue_date = field_or(&draft.issue_date, "[Date]");
    let fit_test_type = draft
        .fit_test_type
        .map_or("[Type]", |fit_test_type| fit_test_type.as_str());
    let respirator_mfg = draft
        .respirator_mfg
        .as_ref()
        .map(|mfg| mfg.label())
        .filter(|label| !label.is_empty())
        .unwrap_or("[Manufacturer]");
    let testing_agent = draft
        .testing_agent
        .map_or("[Agent]", |agent| agent.as_str());
    let mask_size = draft.mask_size.map_or("[Size]", |size| size.as_str());
    let model = field_or(&draft.model, "[Model]");
    let result = draft.result.map_or("[Result]", |result| result.as_str());
    let result_color = match draft.result {
        Some(TestResult::Pass) => RESULT_PASS_COLOR,
        Some(TestResult::Fail) => RESULT_FAIL_COLOR,
        None => RESULT_NEUTRAL_COLOR,
    };
    let fit_tester = field_or(&draft.fit_tester, "[Tester Name]");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; font-family: 'Georgia', 'Times New Roman', serif; background-color: #e8e8e8;">
  <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #e8e8e8; padding: 40px 20px;">
    <tr>
      <td align="center">
        <table width="800" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden; box-shadow: 0 4px 12px rgba(0,0,0,0.1);">
          <!-- Header with logo and company name -->
          <tr>
            <td style="background: linear-gradient(135deg, #20b2aa 0%, #17a2b8 100%); padding: 30px 40px;">
              <table cellpadding="0" cellspacing="0">
                <tr>
                  <td style="vertical-align: middle; padding-right: 15px;">
                    <div style="width: 50px; height: 50px; background: linear-gradient(135deg, #1e3a8a 0%, #3b82f6 100%); border-radius: 50%; display: inline-block; position: relative;">
                      <div style="position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%); color: white; font-size: 24px;">&#129658;</div>
                    </div>
                  </td>
                  <td style="vertical-align: middle;">
                    <h1 style="margin: 0; font-size: 32px; font-weight: bold; color: #ffffff; font-family: 'Georgia', serif; text-shadow: 0 2px 4px rgba(0,0,0,0.2);">Secure Fit LLC</h1>
                  </td>
                </tr>
              </table>
            </td>
          </tr>
          <!-- Title section -->
          <tr>
            <td style="background-color: #ffffff; padding: 20px 40px 30px 40px;">
              <h2 style="margin: 0; font-size: 24px; font-weight: bold; color: #20b2aa; font-family: 'Georgia', serif; display: inline-block;">Fit Testing Results E-card</h2>
              <span style="margin-left: 20px; font-size: 14px; color: #666;">Secure Fit: Precision in every breath.</span>
            </td>
          </tr>
          <!-- Main content panel -->
          <tr>
            <td style="background-color: #ffffff; padding: 40px;">
              <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 12px; border: 2px solid #f0f0f0;">
                <tr>
                  <td style="padding: 30px;">
                    <table width="100%" cellpadding="0" cellspacing="0">
                      <tr>
                        <!-- Left column: QR code and client info -->
                        <td width="200" valign="top" style="padding-right: 30px;">
                          <table cellpadding="0" cellspacing="0" style="margin-bottom: 30px;">
                            <tr>
                              <td style="padding-bottom: 12px; text-align: center;">
                                <p style="margin: 0; font-size: 14px; font-weight: 600; color: #1e3a8a; font-family: 'Georgia', serif;">Need to reschedule?</p>
                              </td>
                            </tr>
                            <tr>
                              <td style="text-align: center;">
                                <img src="{qr_image_url}" alt="QR Code - Scan to reschedule" style="width: 150px; height: 150px; border: 2px solid #e0e0e0; border-radius: 4px; display: block; margin: 0 auto;" />
                              </td>
                            </tr>
                          </table>
                          <table width="100%" cellpadding="0" cellspacing="0">
                            <tr>
                              <td style="padding-bottom: 15px;">
                                <span style="font-size: 16px; font-weight: bold; color: #333; display: block; margin-bottom: 8px;">Client Name:</span>
                                <div style="padding: 8px 15px; background-color: #f5f5f5; border: 1px solid #ddd; border-radius: 4px; color: #333; font-family: 'Courier New', monospace; font-size: 14px;">{client_name}</div>
                              </td>
                            </tr>
                            <tr>
                              <td style="padding-bottom: 20px;">
                                <span style="font-size: 16px; font-weight: bold; color: #333; display: block; margin-bottom: 8px;">DOB:</span>
                                <div style="padding: 8px 15px; background-color: #f5f5f5; border: 1px solid #ddd; border-radius: 4px; color: #333; font-family: 'Courier New', monospace; font-size: 14px;">{dob}</div>
                              </td>
                            </tr>
                          </table>
                        </td>
                        <!-- Right column: fit test details -->
                        <td valign="top">
                          <table width="100%" cellpadding="0" cellspacing="0" style="font-family: 'Courier New', monospace; font-size: 15px;">
                            <tr>
                              <td style="padding: 8px 0; width: 40%; color: #333; font-weight: bold;">Issue Date:</td>
                              <td style="padding: 8px 0; color: #333; text-align: right;">{issue_date}</td>
                            </tr>
                            <tr>
                              <td style="padding: 8px 0; color: #333; font-weight: bold;">Fit Test Type:</td>
                              <td style="padding: 8px 0; color: #333; text-align: right;">{fit_test_type}</td>
                            </tr>
                            <tr>
                              <td style="padding: 8px 0; color: #333; font-weight: bold;">Respirator MFG:</td>
                              <td style="padding: 8px 0; color: #333; text-align: right;">{respirator_mfg}</td>
                            </tr>
                            <tr>
                              <td style="padding: 8px 0; color: #333; font-weight: bold;">Testing Agent:</td>
                              <td style="padding: 8px 0; color: #333; text-align: right;">{testing_agent}</td>
                            </tr>
                            <tr>
                              <td style="padding: 8px 0; color: #333; font-weight: bold;">Mask Size:</td>
                              <td style="padding: 8px 0; color: #333; text-align: right;">{mask_size}</td>
                            </tr>
                            <tr>
                              <td style="padding: 8px 0; color: #333; font-weight: bold;">Model:</td>
                              <td style="padding: 8px 0; color: #333; text-align: right;">{model}</td>
                            </tr>
                            <tr>
                              <td style="padding: 8px 0; color: #333; font-weight: bold;">Result:</td>
                              <td style="padding: 8px 0; color: {result_color}; text-align: right; font-weight: bold;">{result}</td>
                            </tr>
                            <tr>
                              <td style="padding: 8px 0; color: #333; font-weight: bold;">Fit tester:</td>
                              <td style="padding: 8px 0; color: #333; text-align: right;">{fit_tester}</td>
                            </tr>
                          </table>
                        </td>
                      </tr>
                    </table>
                  </td>
                </tr>
              </table>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fit_test::{
        FitTestType, KnownManufacturer, Manufacturer, MaskSize, TestResult, TestingAgent,
    };

    fn filled_draft() -> FormDraft {
        FormDraft {
            recipient_email: "client@example.com".to_string(),
            client_name: "Jordan Reyes".to_string(),
            dob: "01/02/1985".to_string(),
            issue_date: "03/10/2024".to_string(),
            fit_test_type: Some(FitTestType::N95),
            respirator_mfg: Some(Manufacturer::Known(KnownManufacturer::Moldex)),
            testing_agent: Some(TestingAgent::Saccharin),
            mask_size: Some(MaskSize::Small),
            model: "1870+".to_string(),
            result: Some(TestResult::Pass),
            fit_tester: "Sam Okafor".to_string(),
            printed_name: "Jordan Reyes".to_string(),
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let draft = filled_draft();
        assert_eq!(render_fit_test_card(&draft), render_fit_test_card(&draft));
    }

    #[test]
    fn test_all_fields_appear() {
        let html = render_fit_test_card(&filled_draft());
        for value in [
            "Jordan Reyes",
            "01/02/1985",
            "03/10/2024",
            "N95",
            "Moldex",
            "Saccharin",
            "Small",
            "1870+",
            "Sam Okafor",
        ] {
            assert!(html.contains(value), "missing {value}");
        }
    }

    #[test]
    fn test_missing_fields_render_placeholders() {
        let mut draft = filled_draft();
        draft.model = String::new();
        draft.dob = String::new();
        draft.respirator_mfg = Some(Manufacturer::Custom(String::new()));

        let html = render_fit_test_card(&draft);
        assert!(html.contains("[Model]"));
        assert!(html.contains("[Date of Birth]"));
        assert!(html.contains("[Manufacturer]"));

        let empty = render_fit_test_card(&FormDraft::default());
        for placeholder in [
            "[Client Name]",
            "[Date of Birth]",
            "[Date]",
            "[Type]",
            "[Manufacturer]",
            "[Agent]",
            "[Size]",
            "[Model]",
            "[Result]",
            "[Tester Name]",
        ] {
            assert!(empty.contains(placeholder), "missing {placeholder}");
        }
    }

    #[test]
    fn test_result_color_accent() {
        let mut draft = filled_draft();
        assert!(render_fit_test_card(&draft).contains(RESULT_PASS_COLOR));

        draft.result = Some(TestResult::Fail);
        assert!(render_fit_test_card(&draft).contains(RESULT_FAIL_COLOR));

        draft.result = None;
        let html = render_fit_test_card(&draft);
        assert!(!html.contains(RESULT_PASS_COLOR));
        assert!(!html.contains(RESULT_FAIL_COLOR));
        assert!(html.contains("[Result]"));
    }

    #[test]
    fn test_qr_code_is_referenced_not_inlined() {
        let html = render_fit_test_card(&filled_draft());
        assert!(html.contains("api.qrserver.com"));
        assert!(html.contains(&*urlencoding::encode(RESCHEDULE_URL)));
        assert!(!html.contains("data:image"));
    }
}
